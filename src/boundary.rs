//! Inside/outside classification against the convex hull of the samples.
use num_traits::Float;

use crate::error::Error;
use crate::geometry::Vec3;
use crate::mesh::{Location, TetHandle, Tetrahedralization};

/// Where a query point lies relative to the convex hull.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Inside or on the hull, in this finite tetrahedron.
    Inside(TetHandle),
    Outside,
}

/// Decides which queries are interpolated and what outside queries return.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryPolicy<T> {
    null_value: T,
}

impl<T: Float> Default for BoundaryPolicy<T> {
    fn default() -> Self {
        Self::new(T::zero())
    }
}

impl<T: Float> BoundaryPolicy<T> {
    pub fn new(null_value: T) -> Self {
        Self { null_value }
    }

    /// The value emitted for queries outside the hull.
    pub fn null_value(&self) -> T {
        self.null_value
    }

    pub fn set_null_value(&mut self, null_value: T) {
        self.null_value = null_value;
    }

    /// Classify a query point, walking from `hint` if given.
    /// Points on the hull are inside. Points with a non-finite coordinate
    /// are outside.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn classify(
        &self,
        mesh: &Tetrahedralization,
        q: &Vec3,
        hint: Option<TetHandle>,
    ) -> Result<Classification, Error> {
        if !q.iter().all(|x| x.is_finite()) {
            return Ok(Classification::Outside);
        }
        Ok(match mesh.locate(q, hint)? {
            Location::Inside(t) => Classification::Inside(t),
            Location::OutsideHull(_) => Classification::Outside,
        })
    }

    /// Convert an interpolated value to the output type, or emit the null
    /// value if there is none.
    pub fn resolve(&self, value: Option<f64>) -> T {
        value
            .and_then(<T as num_traits::NumCast>::from)
            .unwrap_or(self.null_value)
    }
}
