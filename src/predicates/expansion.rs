//! Exact arithmetic on nonoverlapping floating-point expansions.
//!
//! An expansion is an unevaluated sum of `f64` components, stored in order of
//! increasing magnitude with zero components eliminated. Sums and products of
//! expansions are exact (barring overflow and underflow), so the sign of the
//! largest component is the exact sign of the represented value.
//!
//! Products use `mul_add` for the error term, which is exact because the
//! fused multiply-add rounds only once.
//!
//! References
//! * J. R. Shewchuk, "Adaptive Precision Floating-Point Arithmetic and Fast
//!   Robust Geometric Predicates", Discrete & Computational Geometry 18, 1997.
use core::ops::{Add, Mul, Neg, Sub};

/// `a + b` as a rounded sum and its exact error.
#[inline]
pub(crate) fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bv = x - a;
    let av = x - bv;
    let br = b - bv;
    let ar = a - av;
    (x, ar + br)
}

/// `a + b` for `|a| >= |b|`.
#[inline]
fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bv = x - a;
    (x, b - bv)
}

/// `a - b` as a rounded difference and its exact error.
#[inline]
pub(crate) fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    let bv = a - x;
    let av = x + bv;
    let br = bv - b;
    let ar = a - av;
    (x, ar + br)
}

/// `a * b` as a rounded product and its exact error.
#[inline]
pub(crate) fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    (x, a.mul_add(b, -x))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Expansion(Vec<f64>);

impl Expansion {
    /// The exact difference `a - b`.
    pub(crate) fn diff(a: f64, b: f64) -> Self {
        let (x, y) = two_diff(a, b);
        Self::from_pair(x, y)
    }

    fn from_pair(hi: f64, lo: f64) -> Self {
        let mut e = Vec::with_capacity(2);
        if lo != 0.0 {
            e.push(lo);
        }
        if hi != 0.0 {
            e.push(hi);
        }
        Self(e)
    }

    /// Add a single component, keeping the expansion nonoverlapping.
    fn grow(&self, b: f64) -> Self {
        let mut h = Vec::with_capacity(self.0.len() + 1);
        let mut q = b;
        for &e in &self.0 {
            let (sum, err) = two_sum(q, e);
            if err != 0.0 {
                h.push(err);
            }
            q = sum;
        }
        if q != 0.0 {
            h.push(q);
        }
        Self(h)
    }

    /// Multiply by a single component.
    fn scale(&self, b: f64) -> Self {
        let Some((&first, rest)) = self.0.split_first() else {
            return Self::default();
        };
        if b == 0.0 {
            return Self::default();
        }

        let mut h = Vec::with_capacity(2 * self.0.len());
        let (mut q, err) = two_product(first, b);
        if err != 0.0 {
            h.push(err);
        }
        for &e in rest {
            let (p1, p0) = two_product(e, b);
            let (sum, err) = two_sum(q, p0);
            if err != 0.0 {
                h.push(err);
            }
            let (hi, err) = fast_two_sum(p1, sum);
            if err != 0.0 {
                h.push(err);
            }
            q = hi;
        }
        if q != 0.0 {
            h.push(q);
        }
        Self(h)
    }

    /// Sign of the represented value: -1, 0 or 1.
    pub(crate) fn signum(&self) -> i8 {
        match self.0.last() {
            Some(&x) if x > 0.0 => 1,
            Some(&x) if x < 0.0 => -1,
            _ => 0,
        }
    }

    /// Rounded approximation of the represented value.
    #[cfg(test)]
    pub(crate) fn estimate(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl From<f64> for Expansion {
    fn from(x: f64) -> Self {
        if x == 0.0 {
            Self::default()
        } else {
            Self(vec![x])
        }
    }
}

impl Add for &Expansion {
    type Output = Expansion;

    fn add(self, rhs: &Expansion) -> Expansion {
        // Grow the longer expansion by the components of the shorter one
        let (long, short) = if self.0.len() >= rhs.0.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        short.0.iter().fold(long.clone(), |acc, &b| acc.grow(b))
    }
}

impl Neg for &Expansion {
    type Output = Expansion;

    fn neg(self) -> Expansion {
        Expansion(self.0.iter().map(|x| -x).collect())
    }
}

impl Sub for &Expansion {
    type Output = Expansion;

    fn sub(self, rhs: &Expansion) -> Expansion {
        self + &(-rhs)
    }
}

impl Mul for &Expansion {
    type Output = Expansion;

    fn mul(self, rhs: &Expansion) -> Expansion {
        let (long, short) = if self.0.len() >= rhs.0.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        short
            .0
            .iter()
            .fold(Expansion::default(), |acc, &b| &acc + &long.scale(b))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_two_sum_is_exact() {
        let (x, y) = two_sum(1.0, 1e-20);
        assert_eq!(x, 1.0);
        assert_eq!(y, 1e-20);
    }

    #[test]
    fn test_cancellation_keeps_low_order_bits() {
        // (1 + 2^-60) - 1 is lost in f64 but not in an expansion
        let tiny = 2.0_f64.powi(-60);
        let a = &Expansion::from(1.0) + &Expansion::from(tiny);
        let b = &a - &Expansion::from(1.0);
        assert_eq!(b.signum(), 1);
        assert_eq!(b.estimate(), tiny);
    }

    #[test]
    fn test_product_sign() {
        let a = Expansion::diff(0.1, 0.3);
        let b = Expansion::diff(0.7, 0.2);
        let p = &a * &b;
        assert_eq!(p.signum(), -1);
        assert!((p.estimate() - (0.1 - 0.3) * (0.7 - 0.2)).abs() < 1e-15);

        let zero = &a * &Expansion::default();
        assert_eq!(zero.signum(), 0);
    }
}
