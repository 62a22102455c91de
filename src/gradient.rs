//! Per-node gradient estimates for the Hale-Liang blend.
//!
//! The gradient at a node is the weighted least-squares fit of a linear
//! function through the node's value and the values at its Delaunay
//! neighbors, with each neighbor weighted by the inverse square of its
//! distance. This reproduces the gradient of any linear field exactly.
//!
//! Estimates are computed on first use and cached, so a shared estimator can be
//! read from many threads at once.
use std::sync::OnceLock;

use log::debug;

use crate::error::Error;
use crate::geometry::{dot, sub, Vec3};
use crate::mesh::Tetrahedralization;

/// Relative threshold on the normal-matrix determinant below which the
/// neighbors of a node do not span three dimensions.
const CONDITION_LIMIT: f64 = 1e-6;

/// Gradient at a node, and whether it had to be zeroed because the node's
/// neighbors are too close to coplanar to determine it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeGradient {
    pub g: [f64; 3],
    pub degenerate: bool,
}

/// Lazily computed, cached node gradients.
#[derive(Clone, Debug)]
pub struct GradientEstimator {
    cells: Vec<OnceLock<NodeGradient>>,
}

impl GradientEstimator {
    /// An estimator with nothing computed yet.
    pub fn new(node_count: usize) -> Self {
        Self {
            cells: (0..node_count).map(|_| OnceLock::new()).collect(),
        }
    }

    /// An estimator returning the given gradients instead of estimates.
    ///
    /// # Errors
    /// * If the three components have different lengths
    pub fn with_gradients(g1: &[f64], g2: &[f64], g3: &[f64]) -> Result<Self, Error> {
        if g1.len() != g2.len() || g1.len() != g3.len() {
            return Err(Error::DimensionMismatch);
        }
        let cells = (0..g1.len())
            .map(|i| {
                OnceLock::from(NodeGradient {
                    g: [g1[i], g2[i], g3[i]],
                    degenerate: false,
                })
            })
            .collect();
        Ok(Self { cells })
    }

    pub fn node_count(&self) -> usize {
        self.cells.len()
    }

    /// The gradient at `node`, estimating it on first request.
    pub fn gradient(&self, mesh: &Tetrahedralization, values: &[f64], node: usize) -> NodeGradient {
        *self.cells[node].get_or_init(|| estimate(mesh, values, node))
    }

    /// Estimate every node's gradient now rather than on first use.
    pub fn precompute(&self, mesh: &Tetrahedralization, values: &[f64]) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            (0..self.cells.len()).into_par_iter().for_each(|i| {
                self.gradient(mesh, values, i);
            });
        }
        #[cfg(not(feature = "rayon"))]
        (0..self.cells.len()).for_each(|i| {
            self.gradient(mesh, values, i);
        });
    }

    /// Number of nodes whose gradient is known.
    pub fn computed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.get().is_some()).count()
    }

    /// Nodes whose gradient has been computed and was degenerate.
    pub fn degenerate_nodes(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.get().is_some_and(|g| g.degenerate))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Inverse-square-distance weighted least squares fit at one node.
fn estimate(mesh: &Tetrahedralization, values: &[f64], node: usize) -> NodeGradient {
    let points = mesh.points();
    let neighbors = mesh.node_neighbors(node);
    let gradient = fit(
        &points[node],
        values[node],
        neighbors.iter().map(|&nb| (points[nb], values[nb])),
    );
    if gradient.degenerate {
        debug!("neighbors of node {node} do not span 3D; using a zero gradient");
    }
    gradient
}

/// Fit the gradient of a linear function through `(x0, f0)` and `samples`.
fn fit(x0: &Vec3, f0: f64, samples: impl IntoIterator<Item = (Vec3, f64)>) -> NodeGradient {
    // Normal equations A g = b
    let mut a = [[0.0; 3]; 3];
    let mut b = [0.0; 3];
    for (x, f) in samples {
        let d = sub(&x, x0);
        let w = 1.0 / dot(&d, &d);
        let df = f - f0;
        for i in 0..3 {
            b[i] += w * df * d[i];
            for j in 0..3 {
                a[i][j] += w * d[i] * d[j];
            }
        }
    }

    match solve(&a, &b) {
        Some(g) => NodeGradient {
            g,
            degenerate: false,
        },
        None => NodeGradient {
            g: [0.0; 3],
            degenerate: true,
        },
    }
}

/// Solve the symmetric positive semidefinite system `a x = b` by Cramer's rule,
/// or `None` if `a` is too close to singular.
fn solve(a: &[[f64; 3]; 3], b: &[f64; 3]) -> Option<[f64; 3]> {
    let det = det3(a);
    let mean = (a[0][0] + a[1][1] + a[2][2]) / 3.0;
    if !(det > CONDITION_LIMIT * mean * mean * mean) {
        return None;
    }
    let mut x = [0.0; 3];
    for k in 0..3 {
        let mut ak = *a;
        (0..3).for_each(|i| ak[i][k] = b[i]);
        x[k] = det3(&ak) / det;
    }
    Some(x)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}
