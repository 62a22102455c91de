//! Convenience methods for constructing sample sets and observation points in
//! a way that echoes, but does not exactly match, methods common in scripting
//! languages.
use itertools::Itertools;
use num_traits::{Float, NumCast};

/// Generates evenly spaced values from start to stop,
/// including the endpoint.
pub fn linspace<T>(start: T, stop: T, n: usize) -> Vec<T>
where
    T: Float,
{
    let cast = |i: usize| <T as NumCast>::from(i).unwrap_or_else(T::nan);
    if n < 2 {
        return vec![start; n];
    }
    let dx: T = (stop - start) / cast(n - 1);
    (0..n).map(|i| start + cast(i) * dx).collect()
}

/// Generates a meshgrid in C ordering (x0, y0, z0, x0, y0, z1, ..., x0, yn, zn)
pub fn meshgrid<T>(x: Vec<&Vec<T>>) -> Vec<Vec<T>>
where
    T: Float,
{
    x.into_iter()
        .multi_cartesian_product()
        .map(|xx| xx.iter().map(|y| **y).collect())
        .collect()
}

/// Coordinate columns `[x1, x2, x3]` of an `n x n x n` lattice spanning
/// `[lo, hi]` on each axis, with `x1` varying fastest.
///
/// Lattices are the hardest case for a Delaunay tetrahedralization (every
/// cell is cospherical), which makes them a useful sample set for testing.
pub fn lattice<T>(n: usize, lo: T, hi: T) -> [Vec<T>; 3]
where
    T: Float,
{
    let x = linspace(lo, hi, n);
    // meshgrid varies its last input fastest
    let nodes = meshgrid(vec![&x, &x, &x]);
    [
        nodes.iter().map(|p| p[2]).collect(),
        nodes.iter().map(|p| p[1]).collect(),
        nodes.iter().map(|p| p[0]).collect(),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn test_lattice_order() {
        let [x1, x2, x3] = lattice(2, 0.0, 1.0);
        assert_eq!(x1, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(x2, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(x3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }
}
