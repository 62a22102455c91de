//! Evaluation over regular 3D grids.
//!
//! Grid nodes are visited with the first axis varying fastest. Consecutive
//! nodes are close together, so each query's walk starts from the tetrahedron
//! the previous query was found in, and each row starts from where the
//! previous row started. This makes point location nearly O(1) per node.
use ndarray::Array3;
use num_traits::Float;

use crate::error::Error;
use crate::interpolator::SibsonInterpolator3;
use crate::mesh::TetHandle;
use crate::sampling::Sampling;

impl<T: Float> SibsonInterpolator3<T> {
    /// Interpolate at every node of the grid spanned by three axis samplings.
    ///
    /// The output is indexed `[i3, i2, i1]`. Nodes outside the hull of the
    /// samples get the null value.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn interpolate_grid(
        &self,
        s1: &Sampling<T>,
        s2: &Sampling<T>,
        s3: &Sampling<T>,
    ) -> Result<Array3<T>, Error> {
        let (n1, n2, n3) = (s1.count(), s2.count(), s3.count());
        let mut out = vec![self.null_value(); n1 * n2 * n3];
        self.prepare_gradients();

        let mut hint = None;
        for (i3, slice) in out.chunks_mut(n1 * n2).enumerate() {
            self.evaluate_slice(s1, s2, s3.value(i3), slice, &mut hint)?;
        }

        Array3::from_shape_vec((n3, n2, n1), out).map_err(|_| Error::DimensionMismatch)
    }

    /// Same as [`SibsonInterpolator3::interpolate_grid`], evaluating slices of
    /// constant `x3` in parallel.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    #[cfg(feature = "rayon")]
    pub fn interpolate_grid_par(
        &self,
        s1: &Sampling<T>,
        s2: &Sampling<T>,
        s3: &Sampling<T>,
    ) -> Result<Array3<T>, Error>
    where
        T: Send + Sync,
    {
        use rayon::prelude::*;

        let (n1, n2, n3) = (s1.count(), s2.count(), s3.count());
        let mut out = vec![self.null_value(); n1 * n2 * n3];
        self.prepare_gradients();

        out.par_chunks_mut(n1 * n2)
            .enumerate()
            .try_for_each(|(i3, slice)| {
                // Each task walks from its own hint
                let mut hint = None;
                self.evaluate_slice(s1, s2, s3.value(i3), slice, &mut hint)
            })?;

        Array3::from_shape_vec((n3, n2, n1), out).map_err(|_| Error::DimensionMismatch)
    }

    /// Fill one slice of constant `x3`, indexed `[i2 * n1 + i1]`.
    ///
    /// On return, `hint` is where the first row of the slice started, which is
    /// close to where the next slice will start.
    fn evaluate_slice(
        &self,
        s1: &Sampling<T>,
        s2: &Sampling<T>,
        x3: T,
        out: &mut [T],
        hint: &mut Option<TetHandle>,
    ) -> Result<(), Error> {
        let x3 = Self::coordinate(x3);
        let mut row_start = *hint;
        for (i2, row) in out.chunks_mut(s1.count()).enumerate() {
            let x2 = Self::coordinate(s2.value(i2));
            let mut walk = row_start;
            for (i1, v) in row.iter_mut().enumerate() {
                let q = [Self::coordinate(s1.value(i1)), x2, x3];
                *v = self.resolve(self.evaluate(&q, &mut walk)?);
                if i1 == 0 {
                    row_start = walk;
                }
            }
            if i2 == 0 {
                *hint = row_start;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::geometry::Vec3;
    use crate::testing::*;
    use crate::utils::meshgrid;
    use crate::{Method, Sampling, SibsonInterpolator3};

    fn interpolator(method: Method, points: &[Vec3]) -> SibsonInterpolator3<f64> {
        let f: Vec<f64> = points
            .iter()
            .map(|p| (3.0 * p[0]).sin() + p[1] * p[2])
            .collect();
        let x1: Vec<f64> = points.iter().map(|p| p[0]).collect();
        let x2: Vec<f64> = points.iter().map(|p| p[1]).collect();
        let x3: Vec<f64> = points.iter().map(|p| p[2]).collect();
        SibsonInterpolator3::new(method, &f, &x1, &x2, &x3).unwrap()
    }

    #[test]
    fn test_grid_matches_pointwise() {
        init_logger();
        let mut rng = rng_fixed_seed();
        let points = random_points(&mut rng, 120);
        // Extends past the hull on every side
        let s1 = Sampling::new(9, 0.15, -0.1).unwrap();
        let s2 = Sampling::new(7, 0.2, -0.05).unwrap();
        let s3 = Sampling::new(5, 0.3, -0.1).unwrap();

        for method in Method::ALL {
            let mut interp = interpolator(method, &points);
            interp.set_null_value(-7.0);
            let grid = interp.interpolate_grid(&s1, &s2, &s3).unwrap();
            assert_eq!(grid.shape(), &[5, 7, 9]);

            let mut outside = 0;
            for ((i3, i2, i1), &v) in grid.indexed_iter() {
                let expected = interp
                    .interpolate(s1.value(i1), s2.value(i2), s3.value(i3))
                    .unwrap();
                assert!((v - expected).abs() < 1e-10, "{method} at {:?}", (i3, i2, i1));
                if v == -7.0 {
                    outside += 1;
                }
            }
            assert!(outside > 0);
            assert!(outside < grid.len());

            #[cfg(feature = "rayon")]
            {
                let par = interp.interpolate_grid_par(&s1, &s2, &s3).unwrap();
                grid.iter()
                    .zip(par.iter())
                    .for_each(|(a, b)| assert!((a - b).abs() < 1e-10));
            }
        }
    }

    #[test]
    fn test_lattice_grid_is_linear() {
        // 125 samples of a linear field, evaluated on a grid inside them
        let points = lattice_points(5, 0.0, 1.0);
        let f: Vec<f64> = points.iter().map(|p| p[0] + p[1] + p[2]).collect();
        let x1: Vec<f64> = points.iter().map(|p| p[0]).collect();
        let x2: Vec<f64> = points.iter().map(|p| p[1]).collect();
        let x3: Vec<f64> = points.iter().map(|p| p[2]).collect();
        let interp = SibsonInterpolator3::new(Method::HaleLiang, &f, &x1, &x2, &x3).unwrap();

        let s1 = Sampling::new(39, 1.0 / 40.0, 1.0 / 40.0).unwrap();
        let s23 = Sampling::new(13, 3.0 / 40.0, 1.0 / 40.0).unwrap();
        let grid = interp.interpolate_grid(&s1, &s23, &s23).unwrap();
        assert_eq!(grid.shape(), &[13, 13, 39]);
        for ((i3, i2, i1), &v) in grid.indexed_iter() {
            let expected = s1.value(i1) + s23.value(i2) + s23.value(i3);
            assert!((v - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_grid_matches_meshgrid_order() {
        let points = lattice_points(3, -1.0, 1.0);
        let interp = interpolator(Method::WatsonSambridge, &points);
        let s1 = Sampling::new(4, 0.5, -0.75).unwrap();
        let s2 = Sampling::new(3, 0.5, -0.5).unwrap();
        let s3 = Sampling::new(2, 1.0, -0.5).unwrap();
        let grid = interp.interpolate_grid(&s1, &s2, &s3).unwrap();

        // C ordering with the last axis fastest, matching [i3, i2, i1]
        let (x1, x2, x3) = (s1.values(), s2.values(), s3.values());
        let nodes = meshgrid(vec![&x3, &x2, &x1]);
        for (v, node) in grid.iter().zip(nodes.iter()) {
            let expected = interp.interpolate(node[2], node[1], node[0]).unwrap();
            assert!((v - expected).abs() < 1e-10);
        }
    }
}
