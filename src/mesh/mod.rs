//! Incremental Delaunay tetrahedralization of scattered 3D samples.
//!
//! Tetrahedra live in an arena and refer to each other by integer handle.
//! The convex hull is closed off by ghost tetrahedra, each of which joins one
//! hull face to a [`GHOST`] vertex standing in for the point at infinity. This
//! keeps adjacency total (every face has a tetrahedron on both sides), and a
//! point-location walk that steps into a ghost has, by construction, crossed
//! the hull.
//!
//! Construction is Bowyer-Watson: for each new sample, find every tetrahedron
//! whose circumsphere strictly contains it (for ghosts, every hull face it lies
//! strictly beyond), delete that cavity, and connect the new sample to each face
//! on the cavity's boundary. All decisions go through exact predicates, so the
//! result is a valid Delaunay tetrahedralization even for cospherical or
//! coplanar input such as lattices.
//!
//! Operation Complexity
//! * Construction is O(n log n) for well-distributed samples thanks to the
//!   spatially coherent insertion order, O(n^2) in the worst case.
//! * Point location is O(n^(1/3)) walking steps from an unrelated hint and
//!   O(1) from a nearby one.
//!
//! References
//! * A. Bowyer, "Computing Dirichlet tessellations", The Computer Journal 24, 1981.
//! * D. F. Watson, "Computing the n-dimensional Delaunay tessellation with
//!   application to Voronoi polytopes", The Computer Journal 24, 1981.
//! * O. Devillers, S. Pion, M. Teillaud, "Walking in a triangulation", 2002.
pub mod probe;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use log::{debug, trace};

use crate::error::{DegenerateInput, Error};
use crate::geometry::Vec3;
use crate::predicates::{collinear, insphere, orient3d, Sign};

/// Vertex id of the point at infinity, shared by all ghost tetrahedra.
pub const GHOST: usize = usize::MAX;

/// Placeholder for a neighbor that has not been linked yet.
const UNLINKED: usize = usize::MAX;

/// Bits per axis in the Morton code that orders insertions.
const MORTON_BITS: u32 = 21;

/// Index of a tetrahedron in the arena.
pub type TetHandle = usize;

/// A tetrahedron record.
///
/// Finite tetrahedra are positively oriented. In a ghost tetrahedron, replacing
/// [`GHOST`] by any point strictly beyond its hull face gives a positively
/// oriented tetrahedron.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tet {
    /// Vertex ids
    pub v: [usize; 4],

    /// `n[i]` is the neighbor across the face opposite `v[i]`
    pub n: [TetHandle; 4],

    live: bool,
}

impl Tet {
    fn new(v: [usize; 4]) -> Self {
        Self {
            v,
            n: [UNLINKED; 4],
            live: true,
        }
    }

    /// Whether this tetrahedron closes off a hull face.
    #[inline]
    pub fn is_ghost(&self) -> bool {
        self.v.contains(&GHOST)
    }

    #[inline]
    pub(crate) fn ghost_slot(&self) -> Option<usize> {
        self.v.iter().position(|&x| x == GHOST)
    }

    /// Slot of the vertex not on the given face.
    #[inline]
    fn slot_opposite(&self, face: &[usize; 3]) -> Option<usize> {
        self.v.iter().position(|x| !face.contains(x))
    }
}

/// Sorted vertex ids of the face of `v` opposite slot `i`, used as a lookup key.
#[inline]
pub(crate) fn face_key(v: &[usize; 4], i: usize) -> [usize; 3] {
    let mut f = [0; 3];
    let mut k = 0;
    for (j, &x) in v.iter().enumerate() {
        if j != i {
            f[k] = x;
            k += 1;
        }
    }
    f.sort_unstable();
    f
}

/// Result of point location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// The point is in this finite tetrahedron (possibly on its boundary).
    Inside(TetHandle),
    /// The point is strictly beyond the hull face of this ghost tetrahedron.
    OutsideHull(TetHandle),
}

/// Tetrahedra in conflict with a point, found by a search over face neighbors
/// from a tetrahedron that contains it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cavity {
    pub(crate) tets: Vec<TetHandle>,

    /// Conflict test result for every tetrahedron examined
    verdict: HashMap<TetHandle, bool>,
}

impl Cavity {
    #[inline]
    pub(crate) fn contains(&self, t: TetHandle) -> bool {
        self.verdict.get(&t).copied().unwrap_or(false)
    }
}

/// A Delaunay tetrahedralization of a fixed set of nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Tetrahedralization {
    /// Node coordinates, indexed by sample id
    points: Vec<Vec3>,

    /// Arena of tetrahedra, including ghosts and vacated slots
    tets: Vec<Tet>,

    /// Vacated slots available for reuse
    free: Vec<TetHandle>,

    /// One live finite tetrahedron incident on each node
    node_tet: Vec<TetHandle>,
}

impl Tetrahedralization {
    /// Tetrahedralize a set of points, using each point's index as its node id.
    ///
    /// # Errors
    /// * If there are fewer than 4 points
    /// * If any coordinate is not finite
    /// * If two points coincide
    /// * If all points are coplanar (or collinear)
    pub fn new(mut points: Vec<Vec3>) -> Result<Self, Error> {
        let n = points.len();
        if n < 4 {
            return Err(DegenerateInput::TooFewSamples(n).into());
        }
        if let Some(i) = points.iter().position(|p| p.iter().any(|x| !x.is_finite())) {
            return Err(DegenerateInput::NonFinite(i).into());
        }
        // Fold -0.0 into 0.0 so that coincident points compare equal bitwise in the sort
        points
            .iter_mut()
            .for_each(|p| p.iter_mut().for_each(|x| *x += 0.0));

        let order = insertion_order(&points);

        // Coincident points have the same Morton code and sort next to each other
        if let Some((&i, &j)) = order
            .iter()
            .tuple_windows()
            .find(|&(&i, &j)| points[i] == points[j])
        {
            return Err(DegenerateInput::Duplicate(i.min(j), i.max(j)).into());
        }

        let simplex = initial_simplex(&points, &order)?;

        let mut mesh = Self {
            points,
            tets: Vec::with_capacity(8 * n),
            free: Vec::new(),
            node_tet: vec![UNLINKED; n],
        };
        mesh.init(simplex)?;

        let mut hint = mesh.node_tet[simplex[0]];
        for id in order.into_iter().filter(|i| !simplex.contains(i)) {
            hint = mesh.insert(id, hint)?;
        }
        debug!(
            "tetrahedralized {} nodes into {} tetrahedra",
            n,
            mesh.tet_count()
        );

        Ok(mesh)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.points.len()
    }

    /// Node coordinates, indexed by node id.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of finite tetrahedra.
    pub fn tet_count(&self) -> usize {
        self.tets.iter().filter(|t| t.live && !t.is_ghost()).count()
    }

    /// Number of arena slots, live or vacated. Bounds any walk over the mesh.
    pub(crate) fn slot_count(&self) -> usize {
        self.tets.len()
    }

    /// Number of faces on the convex hull.
    pub fn hull_face_count(&self) -> usize {
        self.tets.iter().filter(|t| t.live && t.is_ghost()).count()
    }

    /// Handles of the live finite tetrahedra.
    pub fn tet_handles(&self) -> impl Iterator<Item = TetHandle> + '_ {
        self.tets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.live && !t.is_ghost())
            .map(|(i, _)| i)
    }

    /// Vertex ids of the live finite tetrahedra.
    pub fn tets(&self) -> impl Iterator<Item = [usize; 4]> + '_ {
        self.tet_handles().map(|t| self.tets[t].v)
    }

    /// The tetrahedron record behind a handle.
    #[inline]
    pub fn tet(&self, t: TetHandle) -> &Tet {
        &self.tets[t]
    }

    /// Centroid of a finite tetrahedron.
    pub fn centroid(&self, t: TetHandle) -> Vec3 {
        let mut c = [0.0; 3];
        for &v in &self.tets[t].v {
            (0..3).for_each(|k| c[k] += 0.25 * self.points[v][k]);
        }
        c
    }

    /// Nodes sharing a Delaunay edge with `node`, in increasing order.
    pub fn node_neighbors(&self, node: usize) -> Vec<usize> {
        let start = self.node_tet[node];
        let mut seen = vec![start];
        let mut stack = vec![start];
        let mut neighbors = BTreeSet::new();
        while let Some(t) = stack.pop() {
            let tet = &self.tets[t];
            for (i, &v) in tet.v.iter().enumerate() {
                if v == node {
                    continue;
                }
                neighbors.insert(v);
                // Faces opposite the other vertices contain `node`
                let nb = tet.n[i];
                if !self.tets[nb].is_ghost() && !seen.contains(&nb) {
                    seen.push(nb);
                    stack.push(nb);
                }
            }
        }
        neighbors.into_iter().collect()
    }

    /// Locate a point, walking from `hint` if one is given.
    ///
    /// Falls back to scanning every tetrahedron if the walk does not converge.
    ///
    /// # Errors
    /// * If no tetrahedron contains the point and no hull face sees it,
    ///   which means the tetrahedralization is corrupt
    pub fn locate(&self, q: &Vec3, hint: Option<TetHandle>) -> Result<Location, Error> {
        let start = hint.unwrap_or(self.node_tet[0]);
        match self.walk(q, start) {
            Some(loc) => Ok(loc),
            None => {
                debug!("walk toward {q:?} did not converge; scanning all tetrahedra");
                self.scan(q)
            }
        }
    }

    /// Check adjacency, orientation and the empty-circumsphere property.
    ///
    /// # Errors
    /// * On the first violated invariant
    pub fn validate(&self) -> Result<(), Error> {
        for (t, tet) in self.tets.iter().enumerate().filter(|(_, x)| x.live) {
            for i in 0..4 {
                let nb = &self.tets[tet.n[i]];
                if !nb.live {
                    return Err(Error::InvariantViolation("neighbor is not live"));
                }
                let face = face_key(&tet.v, i);
                let back = nb
                    .slot_opposite(&face)
                    .ok_or(Error::InvariantViolation("neighbor does not share a face"))?;
                if face_key(&nb.v, back) != face || nb.n[back] != t {
                    return Err(Error::InvariantViolation("adjacency is not symmetric"));
                }
            }
            if tet.is_ghost() {
                continue;
            }
            let [a, b, c, d] = tet.v.map(|v| &self.points[v]);
            if orient3d(a, b, c, d) != Sign::Positive {
                return Err(Error::InvariantViolation("tetrahedron is not positively oriented"));
            }
            // Locally Delaunay on every face implies globally Delaunay
            for i in 0..4 {
                let nb = &self.tets[tet.n[i]];
                if nb.is_ghost() {
                    continue;
                }
                let face = face_key(&tet.v, i);
                let opposite = nb
                    .slot_opposite(&face)
                    .map(|s| nb.v[s])
                    .ok_or(Error::InvariantViolation("neighbor does not share a face"))?;
                if insphere(a, b, c, d, &self.points[opposite]) == Sign::Positive {
                    return Err(Error::InvariantViolation("circumsphere is not empty"));
                }
            }
        }
        Ok(())
    }

    /// Orientation of tetrahedron `t` with the vertex in `slot` replaced by `q`.
    /// The remaining three vertices must be finite.
    #[inline]
    pub(crate) fn orient_with(&self, t: TetHandle, slot: usize, q: &Vec3) -> Sign {
        let v = &self.tets[t].v;
        let p = |i: usize| if i == slot { q } else { &self.points[v[i]] };
        orient3d(p(0), p(1), p(2), p(3))
    }

    /// Whether `q` conflicts with tetrahedron `t`, meaning `t` must be removed
    /// if `q` were inserted.
    ///
    /// A finite tetrahedron conflicts if `q` is strictly inside its circumsphere.
    /// A ghost conflicts if `q` is strictly beyond its hull face, or on the
    /// plane of that face and in conflict with the finite tetrahedron behind it.
    pub(crate) fn in_conflict(&self, t: TetHandle, q: &Vec3) -> bool {
        let tet = &self.tets[t];
        match tet.ghost_slot() {
            None => {
                let [a, b, c, d] = tet.v.map(|v| &self.points[v]);
                insphere(a, b, c, d, q) == Sign::Positive
            }
            Some(k) => match self.orient_with(t, k, q) {
                Sign::Positive => true,
                Sign::Negative => false,
                Sign::Zero => self.in_conflict(tet.n[k], q),
            },
        }
    }

    /// Grow the conflict region of `q` outward from `start`.
    ///
    /// # Errors
    /// * If `start` is not itself in conflict with `q`
    pub(crate) fn conflict_region(&self, q: &Vec3, start: TetHandle) -> Result<Cavity, Error> {
        if !self.in_conflict(start, q) {
            return Err(Error::InvariantViolation(
                "located tetrahedron is not in conflict with the point",
            ));
        }
        let mut cavity = Cavity {
            tets: vec![start],
            verdict: HashMap::from([(start, true)]),
        };
        let mut stack = vec![start];
        while let Some(t) = stack.pop() {
            for &nb in &self.tets[t].n {
                if cavity.verdict.contains_key(&nb) {
                    continue;
                }
                let conflict = self.in_conflict(nb, q);
                cavity.verdict.insert(nb, conflict);
                if conflict {
                    cavity.tets.push(nb);
                    stack.push(nb);
                }
            }
        }
        Ok(cavity)
    }

    /// Build the first finite tetrahedron and the four ghosts around it.
    fn init(&mut self, simplex: [usize; 4]) -> Result<(), Error> {
        let t0 = self.alloc(Tet::new(simplex));
        let mut created = vec![t0];
        for k in 0..4 {
            let mut v = simplex;
            v[k] = GHOST;
            // Swapping two finite vertices puts "outside" on the positive side
            let (i, j) = (0..4)
                .filter(|&i| i != k)
                .next_tuple()
                .ok_or(Error::InvariantViolation("simplex has fewer than 4 slots"))?;
            v.swap(i, j);
            created.push(self.alloc(Tet::new(v)));
        }

        let mut open: HashMap<[usize; 3], (TetHandle, usize)> = HashMap::new();
        for &t in &created {
            for i in 0..4 {
                self.link_or_open(t, i, &mut open);
            }
        }
        if !open.is_empty() {
            return Err(Error::InvariantViolation("initial simplex is not closed"));
        }
        simplex.iter().for_each(|&v| self.node_tet[v] = t0);
        Ok(())
    }

    /// Insert node `id`, returning a new finite tetrahedron incident on it.
    fn insert(&mut self, id: usize, hint: TetHandle) -> Result<TetHandle, Error> {
        let q = self.points[id];
        let start = match self.locate(&q, Some(hint))? {
            Location::Inside(t) | Location::OutsideHull(t) => t,
        };
        let cavity = self.conflict_region(&q, start)?;
        trace!("node {id}: cavity of {} tetrahedra", cavity.tets.len());

        // Read the boundary before any cavity slot is reused
        let mut boundary = Vec::with_capacity(2 * cavity.tets.len() + 4);
        for &c in &cavity.tets {
            let tet = &self.tets[c];
            for i in 0..4 {
                let outer = tet.n[i];
                if !cavity.contains(outer) {
                    let mut v = tet.v;
                    v[i] = id;
                    boundary.push((v, i, outer));
                }
            }
        }
        cavity.tets.iter().for_each(|&c| self.release(c));

        let mut open: HashMap<[usize; 3], (TetHandle, usize)> = HashMap::new();
        let mut newest = UNLINKED;
        for (v, i, outer) in boundary {
            let t = self.alloc(Tet::new(v));

            // Link across the cavity boundary
            let face = face_key(&v, i);
            let back = self.tets[outer]
                .slot_opposite(&face)
                .ok_or(Error::InvariantViolation("cavity boundary face is not shared"))?;
            self.tets[t].n[i] = outer;
            self.tets[outer].n[back] = t;

            // Link to the other new tetrahedra around the new node
            for j in (0..4).filter(|&j| j != i) {
                self.link_or_open(t, j, &mut open);
            }

            if !self.tets[t].is_ghost() {
                v.iter().for_each(|&x| self.node_tet[x] = t);
                newest = t;
            }
        }
        if !open.is_empty() || newest == UNLINKED {
            return Err(Error::InvariantViolation("cavity boundary is not closed"));
        }

        Ok(newest)
    }

    /// Link face `i` of `t` to a tetrahedron already waiting on the same face,
    /// or leave it waiting.
    fn link_or_open(
        &mut self,
        t: TetHandle,
        i: usize,
        open: &mut HashMap<[usize; 3], (TetHandle, usize)>,
    ) {
        let key = face_key(&self.tets[t].v, i);
        match open.remove(&key) {
            Some((u, j)) => {
                self.tets[t].n[i] = u;
                self.tets[u].n[j] = t;
            }
            None => {
                open.insert(key, (t, i));
            }
        }
    }

    fn alloc(&mut self, tet: Tet) -> TetHandle {
        match self.free.pop() {
            Some(t) => {
                self.tets[t] = tet;
                t
            }
            None => {
                self.tets.push(tet);
                self.tets.len() - 1
            }
        }
    }

    fn release(&mut self, t: TetHandle) {
        self.tets[t].live = false;
        self.free.push(t);
    }

    /// Visibility walk toward `q`.
    ///
    /// The face just crossed is never re-tested, and the first face tested
    /// rotates from step to step, which breaks the cycles a fixed test order
    /// can fall into. Returns `None` if the step limit is reached.
    fn walk(&self, q: &Vec3, hint: TetHandle) -> Option<Location> {
        let mut t = self.finite_start(hint);
        let mut prev = UNLINKED;
        let limit = 2 * self.tets.len() + 64;
        for step in 0..limit {
            let tet = &self.tets[t];
            let next = (0..4)
                .map(|j| (j + step) % 4)
                .find(|&i| tet.n[i] != prev && self.orient_with(t, i, q) == Sign::Negative)
                .map(|i| tet.n[i]);
            match next {
                None => return Some(Location::Inside(t)),
                Some(nb) if self.tets[nb].is_ghost() => return Some(Location::OutsideHull(nb)),
                Some(nb) => {
                    prev = t;
                    t = nb;
                }
            }
        }
        None
    }

    /// A live finite tetrahedron at or next to `hint`.
    fn finite_start(&self, hint: TetHandle) -> TetHandle {
        match self.tets.get(hint) {
            Some(tet) if tet.live => match tet.ghost_slot() {
                Some(k) => tet.n[k],
                None => hint,
            },
            _ => self.node_tet[0],
        }
    }

    /// Exhaustive point location.
    fn scan(&self, q: &Vec3) -> Result<Location, Error> {
        if let Some(t) = self.tet_handles().find(|&t| {
            (0..4).all(|i| self.orient_with(t, i, q) != Sign::Negative)
        }) {
            return Ok(Location::Inside(t));
        }
        self.tets
            .iter()
            .enumerate()
            .filter(|(_, tet)| tet.live)
            .find_map(|(t, tet)| {
                let k = tet.ghost_slot()?;
                (self.orient_with(t, k, q) == Sign::Positive).then_some(Location::OutsideHull(t))
            })
            .ok_or(Error::InvariantViolation("point is neither inside nor outside the hull"))
    }
}

/// Spatially coherent insertion order: by Morton code of the normalized
/// coordinates, then lexicographically by coordinates, then by id.
///
/// The order depends only on the set of coordinates, so any permutation of the
/// same samples produces the same tetrahedralization.
fn insertion_order(points: &[Vec3]) -> Vec<usize> {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in points {
        for k in 0..3 {
            lo[k] = lo[k].min(p[k]);
            hi[k] = hi[k].max(p[k]);
        }
    }
    let codes: Vec<u64> = points.iter().map(|p| morton(p, &lo, &hi)).collect();

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        codes[i]
            .cmp(&codes[j])
            .then_with(|| lexicographic(&points[i], &points[j]))
            .then(i.cmp(&j))
    });
    order
}

fn lexicographic(a: &Vec3, b: &Vec3) -> Ordering {
    a[0].total_cmp(&b[0])
        .then(a[1].total_cmp(&b[1]))
        .then(a[2].total_cmp(&b[2]))
}

/// Interleave the bits of the quantized coordinates, most significant first.
fn morton(p: &Vec3, lo: &Vec3, hi: &Vec3) -> u64 {
    let max = ((1_u64 << MORTON_BITS) - 1) as f64;
    let q: [u64; 3] = core::array::from_fn(|k| {
        let span = hi[k] - lo[k];
        let t = if span > 0.0 { (p[k] - lo[k]) / span } else { 0.0 };
        (t.clamp(0.0, 1.0) * max) as u64
    });
    let mut code = 0_u64;
    for bit in (0..MORTON_BITS).rev() {
        for qk in q {
            code = (code << 1) | ((qk >> bit) & 1);
        }
    }
    code
}

/// First four points in insertion order that span a tetrahedron, positively oriented.
fn initial_simplex(points: &[Vec3], order: &[usize]) -> Result<[usize; 4], Error> {
    let (a, b) = (order[0], order[1]);
    let c = order[2..]
        .iter()
        .copied()
        .find(|&c| !collinear(&points[a], &points[b], &points[c]))
        .ok_or(DegenerateInput::Coplanar)?;
    let d = order[2..]
        .iter()
        .copied()
        .find(|&d| orient3d(&points[a], &points[b], &points[c], &points[d]) != Sign::Zero)
        .ok_or(DegenerateInput::Coplanar)?;

    match orient3d(&points[a], &points[b], &points[c], &points[d]) {
        Sign::Negative => Ok([a, b, d, c]),
        _ => Ok([a, b, c, d]),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::*;

    fn cube() -> Vec<Vec3> {
        (0..8)
            .map(|i| {
                [
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                ]
            })
            .collect()
    }

    #[test]
    fn test_single_tet() {
        let pts = vec![
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        let mesh = Tetrahedralization::new(pts).unwrap();
        assert_eq!(mesh.tet_count(), 1);
        assert_eq!(mesh.hull_face_count(), 4);
        mesh.validate().unwrap();
        assert_eq!(mesh.node_neighbors(0), vec![1, 2, 3]);
    }

    #[test]
    fn test_cospherical_cube() {
        let mesh = Tetrahedralization::new(cube()).unwrap();
        mesh.validate().unwrap();
        // Every triangulation of a cube's surface has 12 triangles
        assert_eq!(mesh.hull_face_count(), 12);
        // Finite tetrahedra fill the cube exactly
        let vol: f64 = mesh
            .tet_handles()
            .map(|t| {
                let [a, b, c, d] = mesh.tet(t).v.map(|v| &mesh.points()[v]);
                crate::geometry::tet_volume(a, b, c, d)
            })
            .sum();
        assert!((vol - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_is_delaunay() {
        let mut rng = rng_fixed_seed();
        let pts = random_points(&mut rng, 300);
        let mesh = Tetrahedralization::new(pts).unwrap();
        mesh.validate().unwrap();
        // Euler characteristic of a triangulated sphere: F = 2V - 4 on the hull,
        // so a nonempty hull has an even face count
        assert_eq!(mesh.hull_face_count() % 2, 0);
    }

    #[test]
    fn test_lattice_is_delaunay() {
        let pts = lattice_points(5, 0.0, 1.0);
        let mesh = Tetrahedralization::new(pts).unwrap();
        mesh.validate().unwrap();
        let vol: f64 = mesh
            .tet_handles()
            .map(|t| {
                let [a, b, c, d] = mesh.tet(t).v.map(|v| &mesh.points()[v]);
                crate::geometry::tet_volume(a, b, c, d)
            })
            .sum();
        assert!((vol - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_permutation_independent() {
        let mut rng = rng_fixed_seed();
        let pts = random_points(&mut rng, 100);
        let forward = Tetrahedralization::new(pts.clone()).unwrap();
        let reversed = Tetrahedralization::new(pts.iter().rev().copied().collect()).unwrap();

        let n = pts.len();
        let canonical = |mesh: &Tetrahedralization, relabel: &dyn Fn(usize) -> usize| {
            let mut tets: Vec<[usize; 4]> = mesh
                .tet_handles()
                .map(|t| {
                    let mut v = mesh.tet(t).v.map(relabel);
                    v.sort_unstable();
                    v
                })
                .collect();
            tets.sort_unstable();
            tets
        };
        assert_eq!(
            canonical(&forward, &|v| v),
            canonical(&reversed, &|v| n - 1 - v)
        );
    }

    #[test]
    fn test_locate() {
        let mesh = Tetrahedralization::new(cube()).unwrap();
        match mesh.locate(&[0.1, 0.2, 0.3], None).unwrap() {
            Location::Inside(t) => {
                assert!((0..4).all(|i| mesh.orient_with(t, i, &[0.1, 0.2, 0.3]) != Sign::Negative))
            }
            Location::OutsideHull(_) => panic!("point is inside the cube"),
        }
        assert!(matches!(
            mesh.locate(&[3.0, 0.0, 0.0], None).unwrap(),
            Location::OutsideHull(_)
        ));
        // On the hull counts as inside
        assert!(matches!(
            mesh.locate(&[1.0, 0.5, 0.5], None).unwrap(),
            Location::Inside(_)
        ));
        assert!(matches!(mesh.scan(&[0.0, 0.0, 5.0]).unwrap(), Location::OutsideHull(_)));
    }

    #[test]
    fn test_degenerate_input() {
        let too_few = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(
            Tetrahedralization::new(too_few),
            Err(Error::DegenerateInput(DegenerateInput::TooFewSamples(3)))
        );

        let flat: Vec<Vec3> = (0..10).map(|i| [i as f64, (i * i) as f64, 0.0]).collect();
        assert_eq!(
            Tetrahedralization::new(flat),
            Err(Error::DegenerateInput(DegenerateInput::Coplanar))
        );

        let line: Vec<Vec3> = (0..10).map(|i| [i as f64; 3]).collect();
        assert_eq!(
            Tetrahedralization::new(line),
            Err(Error::DegenerateInput(DegenerateInput::Coplanar))
        );

        let mut dup = cube();
        dup.push([1.0, 1.0, -1.0]);
        assert_eq!(
            Tetrahedralization::new(dup),
            Err(Error::DegenerateInput(DegenerateInput::Duplicate(3, 8)))
        );

        let mut nan = cube();
        nan[5][1] = f64::NAN;
        assert_eq!(
            Tetrahedralization::new(nan),
            Err(Error::DegenerateInput(DegenerateInput::NonFinite(5)))
        );
    }
}
