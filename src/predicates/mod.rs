//! Geometric predicates for the tetrahedralization.
//!
//! Each predicate is first evaluated in plain `f64`. If the magnitude of the
//! result is not safely larger than a bound on its accumulated rounding error,
//! the same determinant is re-evaluated exactly with floating-point expansions.
//! The returned sign is therefore always the exact sign for the given inputs,
//! which is what keeps point-location walks from cycling and cavities from
//! disagreeing with themselves on near-degenerate input.
//!
//! Operation Complexity
//! * O(1) flops on the filtered path, which is taken for nearly all inputs.
//! * The exact path allocates and is a few hundred times slower.
mod expansion;

use expansion::Expansion;

/// Exact sign of a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    #[inline]
    fn of(x: f64) -> Self {
        if x > 0.0 {
            Sign::Positive
        } else if x < 0.0 {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }

    #[inline]
    fn from_i8(s: i8) -> Self {
        match s {
            1 => Sign::Positive,
            -1 => Sign::Negative,
            _ => Sign::Zero,
        }
    }

    /// Reverse the sign.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
            Sign::Zero => Sign::Zero,
        }
    }
}

// Relative error bounds for the filtered evaluations, in units of the permanent
// (the same expression with every term replaced by its absolute value).
// These are several times looser than the tight bounds for these
// evaluation orders, which only costs an occasional trip through the exact path.
const ORIENT2D_ERRBOUND: f64 = 1e-15;
const ORIENT3D_ERRBOUND: f64 = 1e-14;
const INSPHERE_ERRBOUND: f64 = 1e-13;

/// Rows left over when deleting each row of a 4x4 matrix, in order.
const MINORS: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Orientation of `c` relative to the line through `a` and `b` after projecting
/// onto the coordinate plane spanned by axes `i` and `j`.
/// Positive if `(a, b, c)` turn counterclockwise in that plane.
pub fn orient2d(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], i: usize, j: usize) -> Sign {
    let (ux, uy) = (b[i] - a[i], b[j] - a[j]);
    let (vx, vy) = (c[i] - a[i], c[j] - a[j]);
    let l = ux * vy;
    let r = uy * vx;
    let det = l - r;
    let permanent = l.abs() + r.abs();
    if det.abs() > ORIENT2D_ERRBOUND * permanent {
        return Sign::of(det);
    }

    let ux = Expansion::diff(b[i], a[i]);
    let uy = Expansion::diff(b[j], a[j]);
    let vx = Expansion::diff(c[i], a[i]);
    let vy = Expansion::diff(c[j], a[j]);
    Sign::from_i8((&(&ux * &vy) - &(&uy * &vx)).signum())
}

/// Whether three points lie on a common line.
pub fn collinear(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> bool {
    [(0, 1), (1, 2), (2, 0)]
        .iter()
        .all(|&(i, j)| orient2d(a, b, c, i, j) == Sign::Zero)
}

/// Orientation of `d` relative to the plane through `a`, `b`, `c`:
/// the sign of `(b - a) . ((c - a) x (d - a))`.
///
/// Positive when `(a, b, c, d)` is a right-handed (positively oriented)
/// tetrahedron, zero when the four points are coplanar.
pub fn orient3d(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], d: &[f64; 3]) -> Sign {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let w = [d[0] - a[0], d[1] - a[1], d[2] - a[2]];

    let (m0l, m0r) = (v[1] * w[2], v[2] * w[1]);
    let (m1l, m1r) = (v[2] * w[0], v[0] * w[2]);
    let (m2l, m2r) = (v[0] * w[1], v[1] * w[0]);
    let det = u[0] * (m0l - m0r) + u[1] * (m1l - m1r) + u[2] * (m2l - m2r);
    let permanent = u[0].abs() * (m0l.abs() + m0r.abs())
        + u[1].abs() * (m1l.abs() + m1r.abs())
        + u[2].abs() * (m2l.abs() + m2r.abs());
    if det.abs() > ORIENT3D_ERRBOUND * permanent {
        return Sign::of(det);
    }

    let rows = [
        diff_row(b, a),
        diff_row(c, a),
        diff_row(d, a),
    ];
    Sign::from_i8(det3_exact(&rows[0], &rows[1], &rows[2]).signum())
}

/// Position of `e` relative to the circumsphere of the positively oriented
/// tetrahedron `(a, b, c, d)`: positive strictly inside, zero on the sphere,
/// negative outside.
///
/// The result is meaningless for a degenerate (flat) tetrahedron.
pub fn insphere(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], d: &[f64; 3], e: &[f64; 3]) -> Sign {
    // Rows of the lifted matrix, relative to `e`
    let lift = |p: &[f64; 3]| {
        let r = [p[0] - e[0], p[1] - e[1], p[2] - e[2]];
        [r[0], r[1], r[2], r[0] * r[0] + r[1] * r[1] + r[2] * r[2]]
    };
    let rows = [lift(a), lift(b), lift(c), lift(d)];

    // Cofactor expansion along the lifted column
    let mut det = 0.0;
    let mut permanent = 0.0;
    for (k, [i, j, l]) in MINORS.iter().copied().enumerate() {
        let (minor, minor_permanent) = det3_filtered(&rows[i], &rows[j], &rows[l]);
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        det += sign * rows[k][3] * minor;
        permanent += rows[k][3].abs() * minor_permanent;
    }
    if det.abs() > INSPHERE_ERRBOUND * permanent {
        // The lifted determinant is negative for points inside
        return Sign::of(det).flip();
    }

    let exact: Vec<[Expansion; 4]> = [a, b, c, d]
        .iter()
        .map(|p| {
            let [x, y, z] = diff_row(p, e);
            let w = &(&(&x * &x) + &(&y * &y)) + &(&z * &z);
            [x, y, z, w]
        })
        .collect();
    let mut det = Expansion::default();
    for (k, [i, j, l]) in MINORS.iter().copied().enumerate() {
        let minor = det3_exact(&exact[i], &exact[j], &exact[l]);
        let term = &exact[k][3] * &minor;
        det = if k % 2 == 0 { &det - &term } else { &det + &term };
    }
    Sign::from_i8(det.signum()).flip()
}

/// 3x3 determinant of the first three columns of three rows, with its permanent.
#[inline]
fn det3_filtered(r0: &[f64; 4], r1: &[f64; 4], r2: &[f64; 4]) -> (f64, f64) {
    let (m0l, m0r) = (r1[1] * r2[2], r1[2] * r2[1]);
    let (m1l, m1r) = (r1[2] * r2[0], r1[0] * r2[2]);
    let (m2l, m2r) = (r1[0] * r2[1], r1[1] * r2[0]);
    let det = r0[0] * (m0l - m0r) + r0[1] * (m1l - m1r) + r0[2] * (m2l - m2r);
    let permanent = r0[0].abs() * (m0l.abs() + m0r.abs())
        + r0[1].abs() * (m1l.abs() + m1r.abs())
        + r0[2].abs() * (m2l.abs() + m2r.abs());
    (det, permanent)
}

fn diff_row(p: &[f64; 3], origin: &[f64; 3]) -> [Expansion; 3] {
    [
        Expansion::diff(p[0], origin[0]),
        Expansion::diff(p[1], origin[1]),
        Expansion::diff(p[2], origin[2]),
    ]
}

/// Exact 3x3 determinant of the first three entries of three rows.
fn det3_exact(u: &[Expansion], v: &[Expansion], w: &[Expansion]) -> Expansion {
    let m0 = &(&v[1] * &w[2]) - &(&v[2] * &w[1]);
    let m1 = &(&v[2] * &w[0]) - &(&v[0] * &w[2]);
    let m2 = &(&v[0] * &w[1]) - &(&v[1] * &w[0]);
    &(&(&u[0] * &m0) + &(&u[1] * &m1)) + &(&u[2] * &m2)
}
