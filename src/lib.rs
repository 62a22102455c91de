//! Natural-neighbor (Sibson) interpolation of scattered samples in 3D,
//! prioritizing correctness on degenerate input and throughput on dense
//! observation grids.
//!
//! The samples are tetrahedralized once with an incremental Delaunay
//! construction driven by exact geometric predicates. Each query is then
//! inserted as a temporary probe that never modifies the shared
//! tetrahedralization, and its Sibson coordinates are read off the Voronoi
//! volume it would steal from its natural neighbors.
//!
//! # Methods
//! | Method            | Continuity         | Bounded by samples | Needs gradients |
//! |-------------------|--------------------|--------------------|-----------------|
//! | `WatsonSambridge` | C0                 | yes                | no              |
//! | `BraunSambridge`  | C0                 | yes                | no              |
//! | `HaleLiang`       | C1 off the samples | no                 | yes             |
//!
//! All methods reproduce sample values exactly at the samples, and return a
//! configurable null value outside the convex hull of the samples. Gradients
//! are estimated from Delaunay neighbors on first use, or may be supplied.
//!
//! # Performance Scalings
//! * Construction is O(n log n) for well-distributed samples.
//! * A query costs a walk to its location plus work proportional to the
//!   number of tetrahedra whose circumspheres contain it, which is O(1)
//!   on average. Grid evaluation starts each walk next to the previous
//!   query, so the walk is nearly free.
//!
//! # Example: Pointwise and Grid Evaluation
//! ```rust
//! use sibson::{utils::lattice, Method, Sampling, SibsonInterpolator3};
//!
//! // 4x4x4 samples of f = x1 * x2 + x3 on the unit cube
//! let [x1, x2, x3] = lattice(4, 0.0_f64, 1.0);
//! let f: Vec<f64> = (0..x1.len()).map(|i| x1[i] * x2[i] + x3[i]).collect();
//!
//! let interpolator =
//!     SibsonInterpolator3::new(Method::WatsonSambridge, &f, &x1, &x2, &x3).unwrap();
//!
//! // Exact at the samples
//! let v = interpolator.interpolate(x1[5], x2[5], x3[5]).unwrap();
//! assert!((v - f[5]).abs() < 1e-12);
//!
//! // 10 x 10 x 10 grid, indexed [i3, i2, i1]
//! let s = Sampling::new(10, 0.1, 0.05).unwrap();
//! let grid = interpolator.interpolate_grid(&s, &s, &s).unwrap();
//! assert_eq!(grid.shape(), &[10, 10, 10]);
//!
//! // Same samples, smoother method
//! let smooth = interpolator.with_method(Method::HaleLiang);
//! let _ = smooth.interpolate(0.3, 0.6, 0.9).unwrap();
//! ```
// These "needless" range loops are a significant speedup
#![allow(clippy::needless_range_loop)]

pub mod boundary;
pub mod error;
mod geometry;
pub mod gradient;
mod grid;
pub mod interpolator;
pub mod mesh;
pub mod method;
pub mod predicates;
pub mod sampling;
pub mod sibson;
pub mod utils;

pub use boundary::{BoundaryPolicy, Classification};
pub use error::{DegenerateInput, Error};
pub use geometry::Vec3;
pub use gradient::{GradientEstimator, NodeGradient};
pub use interpolator::SibsonInterpolator3;
pub use mesh::{Location, Tetrahedralization};
pub use method::Method;
pub use sampling::Sampling;
pub use sibson::Weights;

#[cfg(test)]
pub(crate) mod testing;
