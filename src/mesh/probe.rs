//! Temporary insertion of a query point.
//!
//! A probe describes what inserting a point would do to the tetrahedralization
//! (which tetrahedra it would delete and which it would create) without
//! touching the tetrahedralization itself. The shared mesh stays immutable, so
//! any number of probes can be alive at once on different threads, and
//! removing a probe restores the prior state trivially.
use std::collections::{BTreeSet, HashMap};

use super::{face_key, Cavity, Location, TetHandle, Tetrahedralization, GHOST};
use crate::error::Error;
use crate::geometry::Vec3;

/// Vertex id of the probe point in the tetrahedra it would create.
pub const PROBE: usize = usize::MAX - 1;

/// A tetrahedron that inserting the probe would create: the probe joined to
/// one face on the boundary of its cavity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeTet {
    /// Vertex ids, with [`PROBE`] in slot `probe_slot`
    pub v: [usize; 4],
    pub probe_slot: usize,

    /// Deleted tetrahedron this one replaces
    pub inner: TetHandle,

    /// Surviving tetrahedron across the boundary face
    pub outer: TetHandle,
}

impl ProbeTet {
    /// The boundary face `(a, b, c)`, ordered so that `(a, b, c, probe)` is
    /// positively oriented.
    pub fn face(&self) -> [usize; 3] {
        let mut v = self.v;
        if self.probe_slot != 3 {
            // Two transpositions preserve orientation
            v.swap(self.probe_slot, 3);
            v.swap(0, 1);
        }
        [v[0], v[1], v[2]]
    }
}

/// A query point as if inserted into the tetrahedralization.
#[derive(Clone, Debug)]
pub struct Probe {
    point: Vec3,
    located: TetHandle,
    cavity: Cavity,
    tets: Vec<ProbeTet>,
    by_face: HashMap<[usize; 3], usize>,
}

/// Outcome of [`Tetrahedralization::insert_probe`].
#[derive(Clone, Debug)]
pub enum ProbeInsertion {
    /// The point is strictly outside the convex hull.
    Outside,
    /// The point coincides with a node of the tetrahedron it was located in.
    Coincident { node: usize, located: TetHandle },
    Inserted(Probe),
}

impl Probe {
    /// Coordinates of the probe point.
    pub fn point(&self) -> &Vec3 {
        &self.point
    }

    /// Finite tetrahedron containing the probe point.
    pub fn located(&self) -> TetHandle {
        self.located
    }

    /// Tetrahedra that inserting the probe would delete.
    pub fn cavity(&self) -> &[TetHandle] {
        &self.cavity.tets
    }

    /// Whether inserting the probe would delete tetrahedron `t`.
    #[inline]
    pub fn deletes(&self, t: TetHandle) -> bool {
        self.cavity.contains(t)
    }

    /// Tetrahedra that inserting the probe would create.
    pub fn tets(&self) -> &[ProbeTet] {
        &self.tets
    }

    /// Index into [`Probe::tets`] of the new tetrahedron on a cavity boundary
    /// face, given as sorted vertex ids.
    #[inline]
    pub fn tet_on_face(&self, face: &[usize; 3]) -> Option<usize> {
        self.by_face.get(face).copied()
    }

    /// Whether the cavity reaches the convex hull, in which case the probe's
    /// Voronoi cell would be unbounded.
    pub fn touches_hull(&self, mesh: &Tetrahedralization) -> bool {
        self.cavity.tets.iter().any(|&t| mesh.tet(t).is_ghost())
    }

    /// Nodes that would share a Delaunay edge with the probe, in increasing order.
    pub fn natural_neighbors(&self, mesh: &Tetrahedralization) -> Vec<usize> {
        self.cavity
            .tets
            .iter()
            .flat_map(|&t| mesh.tet(t).v)
            .filter(|&v| v != GHOST)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Tetrahedralization {
    /// Compute the effect of inserting `q`, walking from `hint` to find it.
    ///
    /// Points on the hull count as inside, and points with a non-finite
    /// coordinate as outside. The tetrahedralization is not modified.
    ///
    /// # Errors
    /// * If the tetrahedralization is corrupt
    pub fn insert_probe(&self, q: &Vec3, hint: Option<TetHandle>) -> Result<ProbeInsertion, Error> {
        if !q.iter().all(|x| x.is_finite()) {
            return Ok(ProbeInsertion::Outside);
        }
        let located = match self.locate(q, hint)? {
            Location::OutsideHull(_) => return Ok(ProbeInsertion::Outside),
            Location::Inside(t) => t,
        };
        if let Some(&node) = self.tet(located).v.iter().find(|&&v| self.points()[v] == *q) {
            return Ok(ProbeInsertion::Coincident { node, located });
        }

        let cavity = self.conflict_region(q, located)?;
        let mut tets = Vec::with_capacity(2 * cavity.tets.len() + 4);
        let mut by_face = HashMap::with_capacity(2 * cavity.tets.len() + 4);
        for &inner in &cavity.tets {
            let tet = self.tet(inner);
            for (i, &outer) in tet.n.iter().enumerate() {
                if cavity.contains(outer) {
                    continue;
                }
                let mut v = tet.v;
                v[i] = PROBE;
                by_face.insert(face_key(&tet.v, i), tets.len());
                tets.push(ProbeTet {
                    v,
                    probe_slot: i,
                    inner,
                    outer,
                });
            }
        }

        Ok(ProbeInsertion::Inserted(Probe {
            point: *q,
            located,
            cavity,
            tets,
            by_face,
        }))
    }

    /// Discard a probe, returning the tetrahedron it was located in for use as
    /// the next walk hint.
    pub fn remove_probe(&self, probe: Probe) -> TetHandle {
        probe.located
    }
}
