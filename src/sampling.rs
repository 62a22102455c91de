//! Uniform sampling of one grid axis.
use num_traits::{Float, NumCast};

use crate::error::Error;

/// `count` evenly spaced values `first, first + delta, ...`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampling<T: Float> {
    count: usize,
    delta: T,
    first: T,
}

impl<T: Float> Sampling<T> {
    /// # Errors
    /// * If `count` is zero
    /// * If `delta` or `first` is not finite
    pub fn new(count: usize, delta: T, first: T) -> Result<Self, Error> {
        if count == 0 || !delta.is_finite() || !first.is_finite() {
            return Err(Error::DimensionMismatch);
        }
        Ok(Self {
            count,
            delta,
            first,
        })
    }

    /// `count` values evenly spaced from `first` to `last` inclusive.
    ///
    /// # Errors
    /// * If `count` is zero, or is one while `first != last`
    pub fn between(count: usize, first: T, last: T) -> Result<Self, Error> {
        let delta = match count {
            0 => return Err(Error::DimensionMismatch),
            1 if first == last => T::zero(),
            1 => return Err(Error::DimensionMismatch),
            n => (last - first) / <T as NumCast>::from(n - 1).ok_or(Error::DimensionMismatch)?,
        };
        Self::new(count, delta, first)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn delta(&self) -> T {
        self.delta
    }

    pub fn first(&self) -> T {
        self.first
    }

    pub fn last(&self) -> T {
        self.value(self.count - 1)
    }

    /// The `i`th sample value, computed as `first + i * delta` so that
    /// rounding does not accumulate along the axis.
    #[inline]
    pub fn value(&self, i: usize) -> T {
        self.first + self.delta * <T as NumCast>::from(i).unwrap_or_else(T::nan)
    }

    pub fn values(&self) -> Vec<T> {
        (0..self.count).map(|i| self.value(i)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::linspace;

    #[test]
    fn test_values() {
        let s = Sampling::new(39, 1.0 / 40.0, 1.0 / 40.0).unwrap();
        assert_eq!(s.count(), 39);
        assert_eq!(s.value(0), 0.025);
        assert!((s.last() - 0.975).abs() < 1e-15);
        assert_eq!(s.values().len(), 39);
    }

    #[test]
    fn test_between_matches_linspace() {
        let s = Sampling::between(11, -1.0_f32, 1.0).unwrap();
        let x = linspace(-1.0_f32, 1.0, 11);
        s.values()
            .iter()
            .zip(x.iter())
            .for_each(|(a, b)| assert!((a - b).abs() < 1e-6));
        assert_eq!(Sampling::between(1, 2.0, 2.0).unwrap().values(), vec![2.0]);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(Sampling::new(0, 1.0, 0.0), Err(Error::DimensionMismatch));
        assert_eq!(Sampling::new(3, f64::NAN, 0.0), Err(Error::DimensionMismatch));
        assert_eq!(Sampling::between(1, 0.0, 1.0), Err(Error::DimensionMismatch));
    }
}
