//! Stage 3: incremental Delaunay construction, after the sweep-hull
//! algorithm used by mapbox/delaunator: seed-triangle selection, a
//! pseudoangle-bucketed hull hash for visible-edge lookup, and
//! edge-flip legalization on insertion. Generic over the [`Kernel`]
//! arithmetic capability; every halfedge's `constrained` entry starts
//! `Unconstrained`.

use crate::hull::Hull;
use crate::kernel::Kernel;
use crate::mesh::Mesh;
use crate::settings::ConstraintKind;
use crate::status::Status;

/// Select the seed triangle: `i0` closest to the axis-aligned
/// bounding-box center, `i1` closest to `i0`, `i2` minimizing the
/// circumradius of `(i0, i1, i2)`, oriented clockwise.
fn seed_triangle<K: Kernel>(points: &[K::Point]) -> Option<(usize, usize, usize)> {
    if points.len() < 3 {
        return None;
    }

    let (bb_min, bb_max) = points.iter().fold(
        (K::from_xy(f64::INFINITY, f64::INFINITY), K::from_xy(f64::NEG_INFINITY, f64::NEG_INFINITY)),
        |(min, max), &p| (K::min(min, p), K::max(max, p)),
    );
    let center = K::from_xy((K::x(bb_min) + K::x(bb_max)) / 2.0, (K::y(bb_min) + K::y(bb_max)) / 2.0);

    let mut i0 = 0usize;
    let mut d0 = f64::INFINITY;
    for (i, &p) in points.iter().enumerate() {
        let d = K::distance_sq(p, center);
        if d < d0 {
            d0 = d;
            i0 = i;
        }
    }
    let p0 = points[i0];

    let mut i1 = usize::MAX;
    let mut d1 = f64::INFINITY;
    for (i, &p) in points.iter().enumerate() {
        if i == i0 {
            continue;
        }
        let d = K::distance_sq(p, p0);
        if d < d1 {
            d1 = d;
            i1 = i;
        }
    }
    if i1 == usize::MAX {
        return None;
    }
    let p1 = points[i1];

    let mut i2 = usize::MAX;
    let mut r2 = f64::INFINITY;
    for (i, &p) in points.iter().enumerate() {
        if i == i0 || i == i1 {
            continue;
        }
        let r = K::circum_radius_sq(p0, p1, p);
        if r < r2 {
            r2 = r;
            i2 = i;
        }
    }
    if i2 == usize::MAX || !r2.is_finite() {
        return None;
    }
    let p2 = points[i2];

    if K::orient2d(p0, p1, p2) < 0.0 {
        Some((i0, i1, i2))
    } else {
        Some((i0, i2, i1))
    }
}

/// Build the initial Delaunay triangulation of every point in `mesh`.
/// `mesh.positions` must already be populated; triangles, halfedges and
/// constrained arrays are (re)built from scratch.
pub(crate) fn build<K: Kernel>(mesh: &mut Mesh<K>, status: &mut Status) {
    let n = mesh.positions.len();
    if n < 3 {
        status.record(Status::DegenerateInput);
        return;
    }

    let Some((i0, i1, i2)) = seed_triangle::<K>(&mesh.positions) else {
        status.record(Status::DegenerateInput);
        return;
    };

    let (p0, p1, p2) = (mesh.positions[i0], mesh.positions[i1], mesh.positions[i2]);
    let center = match K::circum_center(p0, p1, p2) {
        Some(c) => c,
        None => {
            status.record(Status::DegenerateInput);
            return;
        }
    };

    let max_triangles = (2 * n).saturating_sub(5).max(1);
    mesh.triangles = vec![0usize; max_triangles * 3];
    mesh.halfedges = vec![-1isize; max_triangles * 3];
    mesh.constrained = vec![ConstraintKind::Unconstrained; max_triangles * 3];

    let mut ids: Vec<usize> = (0..n).collect();
    let dists: Vec<f64> = mesh.positions.iter().map(|&p| K::distance_sq(p, K::from_xy(center.0, center.1))).collect();
    ids.sort_unstable_by(|&a, &b| dists[a].partial_cmp(&dists[b]).unwrap());

    let mut hull = Hull::new(n, center, max_triangles);
    hull.seed(i0, i1, i2);
    hull.hash_insert::<K>(p0, i0);
    hull.hash_insert::<K>(p1, i1);
    hull.hash_insert::<K>(p2, i2);

    let mut len = 0usize;
    add_triangle(mesh, &mut len, [i0, i1, i2], [None, None, None]);

    let mut prev_point: Option<K::Point> = None;
    'points: for &i in &ids {
        let p = mesh.positions[i];

        if let Some(pp) = prev_point {
            if K::distance_sq(p, pp) <= f64::EPSILON * 2.0 {
                continue;
            }
        }
        prev_point = Some(p);

        if i == i0 || i == i1 || i == i2 {
            continue;
        }

        let key = hull.hash_key::<K>(p);
        let start = hull.find_live_start(key);

        let sstart = hull.prev[start];
        let mut e = sstart;
        let mut q = hull.next[e];
        loop {
            if K::orient2d(p, mesh.positions[e], mesh.positions[q]) < 0.0 {
                break;
            }
            e = q;
            if e == sstart {
                continue 'points;
            }
            q = hull.next[e];
        }

        let mut t = add_triangle(mesh, &mut len, [e, i, hull.next[e]], [None, None, Some(hull.tri[e])]);
        hull.tri[i] = legalize::<K>(mesh, &mut hull, t + 2);
        hull.tri[e] = t;
        hull.size += 1;

        let mut n_ = hull.next[e];
        q = hull.next[n_];
        while K::orient2d(p, mesh.positions[n_], mesh.positions[q]) < 0.0 {
            t = add_triangle(mesh, &mut len, [n_, i, q], [Some(hull.tri[i]), None, Some(hull.tri[n_])]);
            hull.tri[i] = legalize::<K>(mesh, &mut hull, t + 2);
            hull.next[n_] = n_;
            hull.size -= 1;
            n_ = q;
            q = hull.next[n_];
        }

        if e == sstart {
            q = hull.prev[e];
            while K::orient2d(p, mesh.positions[q], mesh.positions[e]) < 0.0 {
                t = add_triangle(mesh, &mut len, [q, i, e], [None, Some(hull.tri[e]), Some(hull.tri[q])]);
                legalize::<K>(mesh, &mut hull, t + 2);
                hull.tri[q] = t;
                hull.next[e] = e;
                hull.size -= 1;
                e = q;
                q = hull.next[e];
            }
        }

        hull.start = e;
        hull.prev[i] = e;
        hull.next[e] = i;
        hull.prev[n_] = i;
        hull.next[i] = n_;

        hull.hash_insert::<K>(p, i);
        hull.hash_insert::<K>(mesh.positions[e], e);
    }

    mesh.hull = Vec::with_capacity(hull.size);
    let mut e = hull.start;
    for _ in 0..hull.size {
        mesh.hull.push(e);
        e = hull.next[e];
    }

    mesh.triangles.truncate(len);
    mesh.halfedges.truncate(len);
    mesh.constrained.truncate(len);
}

fn add_triangle<K: Kernel>(mesh: &mut Mesh<K>, len: &mut usize, verts: [usize; 3], neighbors: [Option<usize>; 3]) -> usize {
    let t = *len;
    mesh.triangles[t] = verts[0];
    mesh.triangles[t + 1] = verts[1];
    mesh.triangles[t + 2] = verts[2];

    mesh.link(t, neighbors[0]);
    mesh.link(t + 1, neighbors[1]);
    mesh.link(t + 2, neighbors[2]);

    *len += 3;
    t
}

/// Legalize the non-hull edge created by the most recent insertion,
/// flipping and recursing with a bounded fixed-size stack.
fn legalize<K: Kernel>(mesh: &mut Mesh<K>, hull: &mut Hull, mut a: usize) -> usize {
    let mut i = 0usize;
    let mut ar;

    loop {
        let b = mesh.twin(a);
        let a0 = a - a % 3;
        ar = a0 + (a + 2) % 3;

        let Some(b) = b else {
            if i == 0 {
                break;
            }
            i -= 1;
            a = hull.edge_stack[i];
            continue;
        };

        let b0 = b - b % 3;
        let al = a0 + (a + 1) % 3;
        let bl = b0 + (b + 2) % 3;

        let p0 = mesh.triangles[ar];
        let pr = mesh.triangles[a];
        let pl = mesh.triangles[al];
        let p1 = mesh.triangles[bl];

        let illegal = K::in_circle(mesh.positions[p0], mesh.positions[pr], mesh.positions[pl], mesh.positions[p1]);

        if illegal {
            mesh.triangles[a] = p1;
            mesh.triangles[b] = p0;

            let hbl = mesh.twin(bl);

            if hbl.is_none() {
                let mut e = hull.start;
                loop {
                    if hull.tri[e] == bl {
                        hull.tri[e] = a;
                        break;
                    }
                    e = hull.prev[e];
                    if e == hull.start {
                        break;
                    }
                }
            }

            let har = mesh.twin(ar);
            mesh.link(a, hbl);
            mesh.link(b, har);
            mesh.link(ar, Some(bl));

            let br = b0 + (b + 1) % 3;

            if i < hull.edge_stack.len() {
                hull.edge_stack[i] = br;
                i += 1;
            }
        } else {
            if i == 0 {
                break;
            }
            i -= 1;
            a = hull.edge_stack[i];
        }
    }
    ar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::F64Kernel;

    fn mesh_from(points: Vec<(f64, f64)>) -> (Mesh<F64Kernel>, Status) {
        let pts = points.into_iter().map(|(x, y)| F64Kernel::from_xy(x, y)).collect();
        let mut mesh = Mesh::<F64Kernel>::new(pts);
        let mut status = Status::Ok;
        build(&mut mesh, &mut status);
        (mesh, status)
    }

    #[test]
    fn single_triangle_scenario() {
        let (mesh, status) = mesh_from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.triangles, vec![0, 2, 1]);
        assert_eq!(mesh.halfedges, vec![-1, -1, -1]);
    }

    #[test]
    fn unit_square_has_one_shared_edge() {
        let (mesh, status) = mesh_from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.num_triangles(), 2);
        let shared = mesh.halfedges.iter().filter(|&&h| h >= 0).count();
        assert_eq!(shared, 2); // one pair of twins
    }

    #[test]
    fn fewer_than_three_points_is_degenerate() {
        let (_, status) = mesh_from(vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(status, Status::DegenerateInput);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let (_, status) = mesh_from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert_eq!(status, Status::DegenerateInput);
    }
}
