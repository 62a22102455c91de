//! Sibson natural-neighbor coordinates.
//!
//! The coordinate of a natural neighbor `a` at query point `q` is the volume
//! that `q`'s Voronoi cell would steal from `a`'s cell if `q` were inserted,
//! divided by the volume of `q`'s cell. Every stolen region is a convex
//! polytope bounded by Voronoi faces that can be read off the probe:
//!
//! * a cap on the bisector of `q` and `a`, whose corners are the circumcenters
//!   of the new tetrahedra around the edge `(q, a)`, and
//! * for each Delaunay edge `(a, w)` of the cavity, the part of the old
//!   Voronoi face between `a` and `w` that `q` takes over, whose corners are the
//!   circumcenters of deleted tetrahedra around the edge plus the points where
//!   that face crosses the cavity boundary.
//!
//! Each polytope's volume is the sum over its faces of
//! `area * (distance from q to the face plane) / 3`, which needs no clipping
//! and is exact up to rounding in the circumcenters.
//!
//! Operation Complexity
//! * O(k) for a probe cavity of k tetrahedra, plus the walk to find it
//!
//! References
//! * R. Sibson, "A brief description of natural neighbour interpolation", 1981.
//! * D. F. Watson, "Compound signed decomposition, the core of natural neighbor
//!   interpolation in n-dimensional space", 2001.
use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::{debug, warn};

use crate::error::Error;
use crate::geometry::{add, circumcenter, dot, norm, scale, sub, tet_volume, vector_area, Vec3};
use crate::mesh::probe::{Probe, ProbeInsertion, PROBE};
use crate::mesh::{TetHandle, Tetrahedralization};

/// First nudge of a query whose Voronoi cell is unbounded or ill-conditioned,
/// relative to the longest edge of the tetrahedron it was located in. Grows
/// by `NUDGE_GROWTH` per retry.
const NUDGE: f64 = 1e-6;
const NUDGE_GROWTH: f64 = 10.0;
const MAX_NUDGES: usize = 4;

/// Largest accepted `|sum w_i x_i - q|`, relative to the same edge length.
/// Weights of a query whose cell reaches far beyond its neighbors cancel
/// catastrophically and fail this check.
const LINEAR_PRECISION: f64 = 1e-8;

/// Natural-neighbor coordinates of a query point.
#[derive(Clone, Debug, PartialEq)]
pub enum Weights {
    /// The point is strictly outside the convex hull of the samples.
    Outside,
    Inside {
        /// `(node, weight)` pairs with positive weights summing to one, by increasing node
        neighbors: Vec<(usize, f64)>,

        /// Tetrahedron containing the point, for use as the next walk hint
        located: TetHandle,
    },
}

/// Natural-neighbor coordinates of `q`, walking from `hint` to find it.
///
/// A query on a sample returns that sample with weight one. A query on or
/// very near the hull has a Voronoi cell that is unbounded or reaches far
/// beyond its neighbors; its weights fail to reproduce the query point, so it
/// is nudged toward the inside of the containing tetrahedron by a small
/// fraction of that tetrahedron's size. If that keeps failing, the
/// barycentric coordinates of the containing tetrahedron are used instead.
/// A query with a non-finite coordinate is outside.
///
/// # Errors
/// * If the tetrahedralization is corrupt
pub fn weights(
    mesh: &Tetrahedralization,
    q: &Vec3,
    hint: Option<TetHandle>,
) -> Result<Weights, Error> {
    let mut probe = match mesh.insert_probe(q, hint)? {
        ProbeInsertion::Outside => return Ok(Weights::Outside),
        ProbeInsertion::Coincident { node, located } => {
            return Ok(Weights::Inside {
                neighbors: vec![(node, 1.0)],
                located,
            });
        }
        ProbeInsertion::Inserted(probe) => probe,
    };
    let located = probe.located();
    let h = longest_edge(mesh, located);

    let mut step = NUDGE;
    for attempt in 0..=MAX_NUDGES {
        let p = *probe.point();
        if probe.touches_hull(mesh) {
            // The Voronoi cell of a point on the hull is unbounded
            debug!("query {p:?} is on the hull");
            mesh.remove_probe(probe);
        } else {
            let volumes = stolen_volumes(mesh, &probe)?;
            mesh.remove_probe(probe);
            match normalize(volumes) {
                Some(neighbors) if residual(mesh, &p, &neighbors) <= LINEAR_PRECISION * h => {
                    return Ok(Weights::Inside { neighbors, located });
                }
                Some(_) => debug!("weights at {p:?} do not reproduce the point"),
                None => debug!("stolen volumes at {p:?} do not normalize"),
            }
        }
        if attempt == MAX_NUDGES {
            break;
        }

        let nudged = nudge(q, &mesh.centroid(located), step * h);
        step *= NUDGE_GROWTH;
        probe = match mesh.insert_probe(&nudged, Some(located))? {
            ProbeInsertion::Inserted(probe) => probe,
            _ => break,
        };
    }

    warn!("query {q:?} is ill-conditioned after nudging; using barycentric weights");
    Ok(barycentric(mesh, q, located))
}

/// Nodes whose Voronoi cells inserting `q` would shrink, in increasing order,
/// or `None` if `q` is outside the hull.
///
/// # Errors
/// * If the tetrahedralization is corrupt
pub fn natural_neighbors(
    mesh: &Tetrahedralization,
    q: &Vec3,
    hint: Option<TetHandle>,
) -> Result<Option<Vec<usize>>, Error> {
    Ok(match mesh.insert_probe(q, hint)? {
        ProbeInsertion::Outside => None,
        ProbeInsertion::Coincident { node, .. } => Some(vec![node]),
        ProbeInsertion::Inserted(probe) => {
            let nn = probe.natural_neighbors(mesh);
            mesh.remove_probe(probe);
            Some(nn)
        }
    })
}

/// Volume stolen from each natural neighbor of the probe.
fn stolen_volumes(mesh: &Tetrahedralization, probe: &Probe) -> Result<Vec<(usize, f64)>, Error> {
    let points = mesh.points();
    // Work relative to the probe point to keep circumcenters well conditioned
    let origin = *probe.point();
    let rel = |node: usize| sub(&points[node], &origin);

    let new_cc: Vec<Vec3> = probe
        .tets()
        .iter()
        .map(|t| {
            let [a, b, c, d] = t.v.map(|v| if v == PROBE { [0.0; 3] } else { rel(v) });
            circumcenter(&a, &b, &c, &d)
        })
        .collect();
    let old_cc: HashMap<TetHandle, Vec3> = probe
        .cavity()
        .iter()
        .map(|&t| {
            let [a, b, c, d] = mesh.tet(t).v.map(rel);
            (t, circumcenter(&a, &b, &c, &d))
        })
        .collect();

    let neighbors = probe.natural_neighbors(mesh);
    let index: HashMap<usize, usize> = neighbors.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut volume = vec![0.0; neighbors.len()];

    // Caps on the bisectors between the probe and each neighbor.
    // Around the edge (probe, a), new tetrahedron (a, b, c, probe) is followed
    // by the one on face (a, c, ...).
    let mut succ: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    let mut first: HashMap<usize, usize> = HashMap::new();
    for (k, t) in probe.tets().iter().enumerate() {
        let [a, b, c] = t.face();
        for (x, y, z) in [(a, b, c), (b, c, a), (c, a, b)] {
            succ.insert((x, y), (z, k));
            first.entry(x).or_insert(y);
        }
    }
    for (i, &a) in neighbors.iter().enumerate() {
        let start = *first
            .get(&a)
            .ok_or(Error::InvariantViolation("natural neighbor is not on the cavity boundary"))?;
        let mut poly = Vec::new();
        let mut b = start;
        loop {
            let &(c, k) = succ
                .get(&(a, b))
                .ok_or(Error::InvariantViolation("cavity boundary is not closed"))?;
            poly.push(new_cc[k]);
            b = c;
            if b == start {
                break;
            }
            if poly.len() > probe.tets().len() {
                return Err(Error::InvariantViolation("cavity boundary is not closed"));
            }
        }
        let axis = rel(a);
        volume[i] += dot(&vector_area(&poly), &axis).abs() / 6.0;
    }

    // Pieces of old Voronoi faces between pairs of neighbors
    let mut done = HashSet::new();
    for &t in probe.cavity() {
        let v = mesh.tet(t).v;
        for (a, w) in v.iter().copied().tuple_combinations() {
            if !done.insert((a.min(w), a.max(w))) {
                continue;
            }
            let poly = edge_face(mesh, probe, &old_cc, &new_cc, t, a, w)?;
            let axis = sub(&points[w], &points[a]);
            let unit = scale(&axis, 1.0 / norm(&axis));
            let area = dot(&vector_area(&poly), &unit).abs();
            let mid = scale(&add(&rel(a), &rel(w)), 0.5);
            // Signed distance from the probe to the bisector plane, positive
            // when the probe is on `a`'s side
            let h = dot(&unit, &mid);
            let piece = area * h / 3.0;
            volume[index[&a]] += piece;
            volume[index[&w]] -= piece;
        }
    }

    Ok(neighbors.into_iter().zip(volume).collect())
}

/// The part of the Voronoi face dual to edge `(a, w)` that lies in the
/// probe's cell, starting the rotation around the edge at cavity tetrahedron `t`.
fn edge_face(
    mesh: &Tetrahedralization,
    probe: &Probe,
    old_cc: &HashMap<TetHandle, Vec3>,
    new_cc: &[Vec3],
    t: TetHandle,
    a: usize,
    w: usize,
) -> Result<Vec<Vec3>, Error> {
    // Slot of the vertex of `tet` that is off the edge and not `skip`
    let other = |tet: TetHandle, skip: usize| {
        mesh.tet(tet)
            .v
            .iter()
            .position(|&x| x != a && x != w && x != skip)
            .ok_or(Error::InvariantViolation("edge is not in tetrahedron"))
    };

    let mut poly = Vec::new();
    let mut cur = t;
    // The third vertex of the face we leave `cur` through
    let mut exit = mesh
        .tet(t)
        .v
        .iter()
        .copied()
        .find(|&x| x != a && x != w)
        .ok_or(Error::InvariantViolation("edge is not in tetrahedron"))?;
    for _ in 0..mesh.slot_count() {
        let across = other(cur, exit)?;
        let next = mesh.tet(cur).n[across];
        let inside = probe.deletes(cur);
        if inside {
            poly.push(old_cc[&cur]);
        }
        if inside != probe.deletes(next) {
            let mut key = [a, w, exit];
            key.sort_unstable();
            let k = probe
                .tet_on_face(&key)
                .ok_or(Error::InvariantViolation("cavity boundary face has no new tetrahedron"))?;
            poly.push(new_cc[k]);
        }
        exit = mesh.tet(next).v[other(next, exit)?];
        cur = next;
        if cur == t {
            return Ok(poly);
        }
    }
    Err(Error::InvariantViolation("rotation around an edge does not close"))
}

/// Length of the longest edge of finite tetrahedron `t`.
fn longest_edge(mesh: &Tetrahedralization, t: TetHandle) -> f64 {
    let p = mesh.tet(t).v.map(|v| mesh.points()[v]);
    (0..4)
        .tuple_combinations()
        .map(|(i, j)| norm(&sub(&p[i], &p[j])))
        .fold(0.0, f64::max)
}

/// Move `q` by `distance` toward `target`, at most halfway.
fn nudge(q: &Vec3, target: &Vec3, distance: f64) -> Vec3 {
    let offset = sub(target, q);
    let d = norm(&offset);
    let t = if d > 0.0 { (distance / d).min(0.5) } else { 0.0 };
    add(q, &scale(&offset, t))
}

/// Distance between `q` and the weighted mean of its neighbors.
fn residual(mesh: &Tetrahedralization, q: &Vec3, neighbors: &[(usize, f64)]) -> f64 {
    let mean = neighbors.iter().fold([0.0; 3], |acc, &(node, w)| {
        add(&acc, &scale(&sub(&mesh.points()[node], q), w))
    });
    norm(&mean)
}

/// Clamp slightly negative volumes from rounding, then scale to sum to one.
/// Returns `None` if nothing positive is left.
fn normalize(volumes: Vec<(usize, f64)>) -> Option<Vec<(usize, f64)>> {
    let total: f64 = volumes.iter().map(|&(_, v)| v.max(0.0)).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    if let Some(&(node, v)) = volumes.iter().find(|&&(_, v)| v < -1e-9 * total) {
        debug!("clamping stolen volume {v:e} of node {node} to zero");
    }
    Some(
        volumes
            .into_iter()
            .filter(|&(_, v)| v > 0.0)
            .map(|(node, v)| (node, v / total))
            .collect(),
    )
}

/// Barycentric coordinates of `q` in finite tetrahedron `t`, clamped to the
/// tetrahedron.
fn barycentric(mesh: &Tetrahedralization, q: &Vec3, t: TetHandle) -> Weights {
    let v = mesh.tet(t).v;
    let p = v.map(|x| mesh.points()[x]);
    let mut lambda = [0.0; 4];
    for i in 0..4 {
        let mut corners = p;
        corners[i] = *q;
        let [a, b, c, d] = corners;
        lambda[i] = tet_volume(&a, &b, &c, &d).max(0.0);
    }
    let total: f64 = lambda.iter().sum();
    let mut neighbors: Vec<(usize, f64)> = if total > 0.0 {
        (0..4)
            .filter(|&i| lambda[i] > 0.0)
            .map(|i| (v[i], lambda[i] / total))
            .collect()
    } else {
        (0..4).map(|i| (v[i], 0.25)).collect()
    };
    neighbors.sort_unstable_by_key(|&(node, _)| node);
    Weights::Inside {
        neighbors,
        located: t,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::{face_key, Location};
    use crate::testing::*;

    fn unwrap_inside(w: Weights) -> Vec<(usize, f64)> {
        match w {
            Weights::Inside { neighbors, .. } => neighbors,
            Weights::Outside => panic!("point should be inside"),
        }
    }

    /// Weights sum to one and reproduce the query point
    fn check_linear_precision(mesh: &Tetrahedralization, q: &Vec3, neighbors: &[(usize, f64)]) {
        let total: f64 = neighbors.iter().map(|&(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12, "total {total}");
        let mut x = [0.0; 3];
        for &(node, w) in neighbors {
            assert!(w > 0.0 && w <= 1.0);
            x = add(&x, &scale(&mesh.points()[node], w));
        }
        (0..3).for_each(|k| assert!((x[k] - q[k]).abs() < 1e-9, "{x:?} != {q:?}"));
    }

    #[test]
    fn test_random_linear_precision() {
        init_logger();
        let mut rng = rng_fixed_seed();
        let mesh = Tetrahedralization::new(random_points(&mut rng, 200)).unwrap();
        let mut hint = None;
        for q in random_points(&mut rng, 100) {
            let q = [0.4 * q[0] + 0.3, 0.4 * q[1] + 0.3, 0.4 * q[2] + 0.3];
            let w = weights(&mesh, &q, hint).unwrap();
            if let Weights::Inside { located, .. } = &w {
                hint = Some(*located);
            }
            check_linear_precision(&mesh, &q, &unwrap_inside(w));
        }
    }

    #[test]
    fn test_cospherical_lattice() {
        init_logger();
        let mesh = Tetrahedralization::new(lattice_points(4, -1.0, 1.0)).unwrap();
        for q in [[0.0, 0.0, 0.0], [0.1, -0.2, 0.3], [0.5, 0.5, 0.5], [-0.9, 0.8, 0.0]] {
            let w = unwrap_inside(weights(&mesh, &q, None).unwrap());
            check_linear_precision(&mesh, &q, &w);
        }
    }

    #[test]
    fn test_cube_center_is_symmetric() {
        let mesh = Tetrahedralization::new(lattice_points(2, -1.0, 1.0)).unwrap();
        let w = unwrap_inside(weights(&mesh, &[0.0; 3], None).unwrap());
        assert_eq!(w.len(), 8);
        w.iter().for_each(|&(_, x)| assert!((x - 0.125).abs() < 1e-12));
        assert_eq!(
            natural_neighbors(&mesh, &[0.0; 3], None).unwrap(),
            Some((0..8).collect())
        );
        assert_eq!(natural_neighbors(&mesh, &[0.0, 0.0, 2.0], None).unwrap(), None);
    }

    #[test]
    fn test_coincident_and_outside() {
        let mesh = Tetrahedralization::new(lattice_points(3, 0.0, 1.0)).unwrap();
        let w = unwrap_inside(weights(&mesh, &mesh.points()[13], None).unwrap());
        assert_eq!(w, vec![(13, 1.0)]);
        assert_eq!(weights(&mesh, &[1.5, 0.5, 0.5], None).unwrap(), Weights::Outside);
    }

    #[test]
    fn test_hull_query_is_finite() {
        init_logger();
        let mesh = Tetrahedralization::new(lattice_points(3, 0.0, 1.0)).unwrap();
        let q = [1.0, 0.3, 0.6];
        let w = unwrap_inside(weights(&mesh, &q, None).unwrap());
        let total: f64 = w.iter().map(|&(_, x)| x).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Nodes off the hull face carry almost no weight
        let off: f64 = w
            .iter()
            .filter(|&&(node, _)| mesh.points()[node][0] < 1.0)
            .map(|&(_, x)| x)
            .sum();
        assert!(off < 1e-3, "weight off the hull face {off}");
    }

    #[test]
    fn test_scattered_hull_faces() {
        init_logger();
        let mut rng = rng_fixed_seed();
        let mesh = Tetrahedralization::new(random_points(&mut rng, 200)).unwrap();

        // Points on each tilted hull face, then slightly inside it
        let mut queries = Vec::new();
        for t in mesh.tet_handles() {
            let tet = mesh.tet(t);
            for i in (0..4).filter(|&i| mesh.tet(tet.n[i]).is_ghost()) {
                let [a, b, c] = face_key(&tet.v, i).map(|v| mesh.points()[v]);
                let on_face = add(&add(&scale(&a, 0.2), &scale(&b, 0.3)), &scale(&c, 0.5));
                let inward = sub(&mesh.centroid(t), &on_face);
                let unit = scale(&inward, 1.0 / norm(&inward));
                for depth in [0.0, 1e-14, 1e-12, 1e-10] {
                    queries.push(add(&on_face, &scale(&unit, depth)));
                }
            }
        }
        assert!(queries.len() > 100);

        let mut inside = 0;
        for q in &queries {
            let neighbors = match weights(&mesh, q, None).unwrap() {
                Weights::Inside { neighbors, .. } => neighbors,
                // Rounding can leave a point on the face just outside it
                Weights::Outside => continue,
            };
            inside += 1;
            let total: f64 = neighbors.iter().map(|&(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-12, "total {total}");
            assert!(neighbors.iter().all(|&(_, w)| w > 0.0));
            // Within the largest nudge of the query
            let r = residual(&mesh, q, &neighbors);
            assert!(r < 2e-3, "weights at {q:?} reproduce a point {r} away");
        }
        assert!(inside > queries.len() / 2);
    }

    #[test]
    fn test_nudge() {
        let q = [0.0; 3];
        let target = [4.0, 0.0, 0.0];
        assert_eq!(nudge(&q, &target, 1.0), [1.0, 0.0, 0.0]);
        assert_eq!(nudge(&q, &target, 10.0), [2.0, 0.0, 0.0]);
        assert_eq!(nudge(&q, &q, 1.0), q);
    }

    #[test]
    fn test_barycentric() {
        let mesh = Tetrahedralization::new(lattice_points(2, 0.0, 1.0)).unwrap();
        let q = [0.25, 0.25, 0.25];
        let t = match mesh.locate(&q, None).unwrap() {
            Location::Inside(t) => t,
            Location::OutsideHull(_) => panic!("point should be inside"),
        };
        let w = unwrap_inside(barycentric(&mesh, &q, t));
        check_linear_precision(&mesh, &q, &w);
    }
}
