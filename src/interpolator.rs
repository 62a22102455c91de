//! The user-facing interpolator binding samples, a blend method, gradients and
//! a null value.
use std::sync::Arc;

use num_traits::{Float, NumCast};

use crate::boundary::{BoundaryPolicy, Classification};
use crate::error::Error;
use crate::geometry::Vec3;
use crate::gradient::GradientEstimator;
use crate::mesh::{TetHandle, Tetrahedralization};
use crate::method::Method;
use crate::sibson::{self, Weights};

/// Tetrahedralized sample locations and their values, shared between
/// interpolators that differ only in method or null value.
#[derive(Debug)]
struct Samples {
    mesh: Tetrahedralization,
    values: Vec<f64>,
}

/// Sibson natural-neighbor interpolator for scattered samples in 3D.
///
/// Queries take `&self` and keep no state between calls, so one interpolator
/// can be queried from many threads at once.
///
/// ```rust
/// use sibson::{Method, SibsonInterpolator3};
///
/// // Corners of a cube, sampling f = x1 + x2 + x3
/// let x1 = [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0];
/// let x2 = [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
/// let x3 = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
/// let f: Vec<f64> = (0..8).map(|i| x1[i] + x2[i] + x3[i]).collect();
///
/// let interpolator = SibsonInterpolator3::new(Method::HaleLiang, &f, &x1, &x2, &x3).unwrap();
/// let v = interpolator.interpolate(0.5, 0.5, 0.5).unwrap();
/// assert!((v - 1.5).abs() < 1e-9);
///
/// // Outside the hull of the samples
/// assert_eq!(interpolator.interpolate(2.0, 0.0, 0.0).unwrap(), 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct SibsonInterpolator3<T: Float> {
    method: Method,
    samples: Arc<Samples>,
    gradients: Arc<GradientEstimator>,
    boundary: BoundaryPolicy<T>,
}

#[inline]
fn to_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

#[inline]
fn from_f64<T: Float>(x: f64) -> T {
    <T as NumCast>::from(x).unwrap_or_else(T::nan)
}

impl<T: Float> SibsonInterpolator3<T> {
    /// Tetrahedralize the samples `(x1[i], x2[i], x3[i])` with values `f[i]`.
    ///
    /// # Errors
    /// * If the four sequences do not all have the same length
    /// * If the sample locations are degenerate (see [`Tetrahedralization::new`])
    pub fn new(method: Method, f: &[T], x1: &[T], x2: &[T], x3: &[T]) -> Result<Self, Error> {
        let n = f.len();
        if !(x1.len() == n && x2.len() == n && x3.len() == n) {
            return Err(Error::DimensionMismatch);
        }
        let points: Vec<Vec3> = (0..n)
            .map(|i| [to_f64(x1[i]), to_f64(x2[i]), to_f64(x3[i])])
            .collect();
        let values = f.iter().copied().map(to_f64).collect();
        let mesh = Tetrahedralization::new(points)?;

        Ok(Self {
            method,
            samples: Arc::new(Samples { mesh, values }),
            gradients: Arc::new(GradientEstimator::new(n)),
            boundary: BoundaryPolicy::default(),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// An interpolator using a different method on the same samples.
    /// The tetrahedralization and gradient cache are shared, not copied.
    pub fn with_method(&self, method: Method) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    /// The value returned for queries outside the hull of the samples.
    /// Defaults to zero.
    pub fn null_value(&self) -> T {
        self.boundary.null_value()
    }

    pub fn set_null_value(&mut self, null_value: T) {
        self.boundary.set_null_value(null_value);
    }

    /// The tetrahedralization of the sample locations.
    pub fn mesh(&self) -> &Tetrahedralization {
        &self.samples.mesh
    }

    /// Use these gradients at the samples instead of estimating them.
    ///
    /// Only [`Method::HaleLiang`] reads gradients.
    ///
    /// # Errors
    /// * If any component does not have one entry per sample
    pub fn set_gradients(&mut self, g1: &[T], g2: &[T], g3: &[T]) -> Result<(), Error> {
        if g1.len() != self.samples.values.len() {
            return Err(Error::DimensionMismatch);
        }
        let cast = |g: &[T]| g.iter().copied().map(to_f64).collect::<Vec<f64>>();
        let estimator = GradientEstimator::with_gradients(&cast(g1), &cast(g2), &cast(g3))?;
        self.gradients = Arc::new(estimator);
        Ok(())
    }

    /// Gradients at every sample, estimating any not yet known.
    pub fn gradients(&self) -> (Vec<T>, Vec<T>, Vec<T>) {
        let Samples { mesh, values } = self.samples.as_ref();
        self.gradients.precompute(mesh, values);
        let n = values.len();
        let (mut g1, mut g2, mut g3) = (
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
        );
        for i in 0..n {
            let g = self.gradients.gradient(mesh, values, i).g;
            g1.push(from_f64(g[0]));
            g2.push(from_f64(g[1]));
            g3.push(from_f64(g[2]));
        }
        (g1, g2, g3)
    }

    /// Interpolate at one point.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn interpolate(&self, x1: T, x2: T, x3: T) -> Result<T, Error> {
        let q = [to_f64(x1), to_f64(x2), to_f64(x3)];
        let value = self.evaluate(&q, &mut None)?;
        Ok(self.resolve(value))
    }

    /// Sibson coordinates of a point as `(sample, weight)` pairs, or `None`
    /// outside the hull.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn weights(&self, x1: T, x2: T, x3: T) -> Result<Option<Vec<(usize, T)>>, Error> {
        let q = [to_f64(x1), to_f64(x2), to_f64(x3)];
        Ok(match sibson::weights(&self.samples.mesh, &q, None)? {
            Weights::Outside => None,
            Weights::Inside { neighbors, .. } => Some(
                neighbors
                    .into_iter()
                    .map(|(node, w)| (node, from_f64(w)))
                    .collect(),
            ),
        })
    }

    /// Samples that are natural neighbors of a point, or `None` outside the hull.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn natural_neighbors(&self, x1: T, x2: T, x3: T) -> Result<Option<Vec<usize>>, Error> {
        let q = [to_f64(x1), to_f64(x2), to_f64(x3)];
        sibson::natural_neighbors(&self.samples.mesh, &q, None)
    }

    /// Boundary check, weights, then blend. `None` outside the hull.
    ///
    /// `hint` is the walk start for this query and is updated to the
    /// tetrahedron the query was found in.
    pub(crate) fn evaluate(
        &self,
        q: &Vec3,
        hint: &mut Option<TetHandle>,
    ) -> Result<Option<f64>, Error> {
        let Samples { mesh, values } = self.samples.as_ref();
        let located = match self.boundary.classify(mesh, q, *hint)? {
            Classification::Outside => return Ok(None),
            Classification::Inside(t) => t,
        };
        *hint = Some(located);

        let neighbors = match sibson::weights(mesh, q, Some(located))? {
            Weights::Outside => return Ok(None),
            Weights::Inside { neighbors, .. } => neighbors,
        };
        let value = self
            .method
            .blend(q, &neighbors, mesh.points(), values, |node| {
                self.gradients.gradient(mesh, values, node).g
            });
        Ok(Some(value))
    }

    /// Estimate every sample's gradient up front if the method reads them, so
    /// that grid evaluation does not estimate them one node at a time.
    pub(crate) fn prepare_gradients(&self) {
        if self.method.uses_gradients() {
            let Samples { mesh, values } = self.samples.as_ref();
            self.gradients.precompute(mesh, values);
        }
    }

    /// Convert an evaluated value to the output type, or the null value.
    #[inline]
    pub(crate) fn resolve(&self, value: Option<f64>) -> T {
        self.boundary.resolve(value)
    }

    #[inline]
    pub(crate) fn coordinate(x: T) -> f64 {
        to_f64(x)
    }
}
