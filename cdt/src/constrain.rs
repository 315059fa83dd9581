//! Stage 4: Sloan's constrained edge insertion. For each constraint
//! edge `(u, v)` not already present in the mesh: walk a tunnel of
//! triangles whose interiors the segment `uv` crosses, then repeatedly
//! flip the tunnel's diagonals until `uv` itself is a mesh edge. A
//! vertex lying exactly on `uv` splits the constraint into two
//! recursive sub-constraints instead.
//!
//! The flip mechanics reuse the same `a`/`b`/`ar`/`al`/`bl` local-index
//! arithmetic as Delaunay legalization, without the `Hull` bookkeeping
//! that stage needs and this one doesn't.

use crate::geom::{point_on_segment, segments_properly_cross};
use crate::kernel::Kernel;
use crate::mesh::Mesh;
use crate::settings::ConstraintKind;
use crate::status::Status;

/// Insert every constraint edge into `mesh`. Input is assumed already
/// validated: indices in range, no self-loops, no crossing input
/// segments.
pub(crate) fn constrain<K: Kernel>(
    mesh: &mut Mesh<K>,
    constraint_edges: &[usize],
    constraint_kinds: &[ConstraintKind],
    max_iters: u64,
    status: &mut Status,
) {
    let mut vertex_out = vertex_outgoing_halfedges(mesh);

    for i in 0..constraint_kinds.len() {
        if status.is_err() {
            return;
        }
        // Store the smaller endpoint first for a stable, order-independent
        // key; it doesn't change which edge gets inserted.
        let (mut u, mut v) = (constraint_edges[2 * i], constraint_edges[2 * i + 1]);
        if u > v {
            std::mem::swap(&mut u, &mut v);
        }
        insert_constraint(mesh, &mut vertex_out, u, v, constraint_kinds[i], max_iters, status);
    }
}

/// Any one outgoing halfedge per vertex, used to seed the one-ring walk.
fn vertex_outgoing_halfedges<K: Kernel>(mesh: &Mesh<K>) -> Vec<usize> {
    let mut out = vec![usize::MAX; mesh.positions.len()];
    for h in 0..mesh.triangles.len() {
        out[mesh.triangles[h]] = h;
    }
    out
}

/// Halfedges with origin `start_h`'s vertex, in rotational order.
/// Returns `(ring, closed)`; `closed` is false for a hull vertex, whose
/// ring is a partial fan rather than a full loop around the vertex.
fn ring_halfedges<K: Kernel>(mesh: &Mesh<K>, start_h: usize) -> (Vec<usize>, bool) {
    let mut ring = vec![start_h];
    let mut h = start_h;
    let mut closed = false;
    loop {
        let prev = Mesh::<K>::prev_halfedge(h);
        match mesh.twin(prev) {
            Some(t) if t == start_h => {
                closed = true;
                break;
            }
            Some(t) => {
                ring.push(t);
                h = t;
            }
            None => break,
        }
    }
    if !closed {
        let mut h = start_h;
        loop {
            match mesh.twin(h) {
                Some(t) => {
                    let prev_h = Mesh::<K>::next_halfedge(t);
                    ring.insert(0, prev_h);
                    h = prev_h;
                }
                None => break,
            }
        }
    }
    (ring, closed)
}

/// Insert a single (already-ordered, `u < v`) constraint edge,
/// recursing on the two halves if a vertex lies exactly on it.
fn insert_constraint<K: Kernel>(
    mesh: &mut Mesh<K>,
    vertex_out: &mut [usize],
    u: usize,
    v: usize,
    kind: ConstraintKind,
    max_iters: u64,
    status: &mut Status,
) {
    if status.is_err() {
        return;
    }

    let (ring, closed) = ring_halfedges(mesh, vertex_out[u]);

    for &h in &ring {
        let w = mesh.triangles[Mesh::<K>::next_halfedge(h)];
        if w == v {
            mesh.constrained[h] = mesh.constrained[h].max(kind);
            if let Some(t) = mesh.twin(h) {
                mesh.constrained[t] = mesh.constrained[t].max(kind);
            }
            return;
        }
    }

    let pu = mesh.point(u);
    let pv = mesh.point(v);
    let num_far_edges = if closed { ring.len() } else { ring.len().saturating_sub(1) };

    for idx in 0..num_far_edges {
        let h_a = ring[idx];
        let h_b = ring[(idx + 1) % ring.len()];
        let wa = mesh.triangles[Mesh::<K>::next_halfedge(h_a)];
        let wb = mesh.triangles[Mesh::<K>::next_halfedge(h_b)];

        if !segments_properly_cross::<K>(pu, pv, mesh.point(wa), mesh.point(wb)) {
            continue;
        }

        let far_edge = Mesh::<K>::next_halfedge(h_a);
        match walk_tunnel(mesh, far_edge, v, pu, pv, max_iters, status) {
            TunnelOutcome::Reached(crossed) => {
                resolve_tunnel(mesh, crossed, u, v, kind, max_iters, status);
                rebuild_vertex_out(mesh, vertex_out);
            }
            TunnelOutcome::SplitAt(w) => {
                insert_constraint(mesh, vertex_out, u, w, kind, max_iters, status);
                if status.is_err() {
                    return;
                }
                rebuild_vertex_out(mesh, vertex_out);
                insert_constraint(mesh, vertex_out, w, v, kind, max_iters, status);
            }
        }
        return;
    }
    // No far edge crossed uv: `u` and `v` are adjacent to a common
    // triangle already, or the input is degenerate in a way validation
    // didn't catch. Either way there's nothing to tunnel through.
}

enum TunnelOutcome {
    Reached(Vec<usize>),
    SplitAt(usize),
}

/// Walk from the first crossed far edge to `v`, collecting every
/// halfedge `uv` passes through the interior of (the tunnel).
fn walk_tunnel<K: Kernel>(
    mesh: &Mesh<K>,
    start_edge: usize,
    v: usize,
    pu: K::Point,
    pv: K::Point,
    max_iters: u64,
    status: &mut Status,
) -> TunnelOutcome {
    let mut crossed = vec![start_edge];
    let mut edge = start_edge;
    let mut iters = 0u64;

    loop {
        iters += 1;
        if iters > max_iters {
            status.record(Status::SloanMaxItersExceeded);
            return TunnelOutcome::Reached(crossed);
        }

        let Some(opp) = mesh.twin(edge) else {
            // The constraint runs off the triangulated region's edge;
            // nothing more to tunnel through.
            return TunnelOutcome::Reached(crossed);
        };

        let w = mesh.triangles[Mesh::<K>::prev_halfedge(opp)];
        if w == v {
            return TunnelOutcome::Reached(crossed);
        }
        if point_on_segment::<K>(pu, pv, mesh.point(w)) {
            return TunnelOutcome::SplitAt(w);
        }

        let e1 = Mesh::<K>::prev_halfedge(opp);
        let (a1, b1) = (mesh.triangles[e1], mesh.triangles[Mesh::<K>::next_halfedge(e1)]);
        if segments_properly_cross::<K>(pu, pv, mesh.point(a1), mesh.point(b1)) {
            crossed.push(e1);
            edge = e1;
            continue;
        }

        let e2 = Mesh::<K>::next_halfedge(opp);
        let (a2, b2) = (mesh.triangles[e2], mesh.triangles[Mesh::<K>::next_halfedge(e2)]);
        if segments_properly_cross::<K>(pu, pv, mesh.point(a2), mesh.point(b2)) {
            crossed.push(e2);
            edge = e2;
            continue;
        }

        // Neither far edge crosses uv: the triangulation must already
        // contain v as this triangle's third vertex, handled above.
        return TunnelOutcome::Reached(crossed);
    }
}

/// Repeatedly flip tunnel diagonals until each either becomes the
/// constraint edge itself or no longer crosses it, bounded by
/// `max_iters` total flip attempts.
fn resolve_tunnel<K: Kernel>(
    mesh: &mut Mesh<K>,
    mut unresolved: Vec<usize>,
    u: usize,
    v: usize,
    kind: ConstraintKind,
    max_iters: u64,
    status: &mut Status,
) {
    let pu = mesh.point(u);
    let pv = mesh.point(v);
    let mut iters = 0u64;

    while !unresolved.is_empty() {
        let mut next_round = Vec::new();

        for h in unresolved {
            iters += 1;
            if iters > max_iters {
                status.record(Status::SloanMaxItersExceeded);
                return;
            }

            let Some(th) = mesh.twin(h) else {
                continue;
            };

            let a0 = h - h % 3;
            let ar = a0 + (h + 2) % 3;
            let al = a0 + (h + 1) % 3;
            let b0 = th - th % 3;
            let bl = b0 + (th + 2) % 3;

            let p0 = mesh.triangles[ar];
            let pr = mesh.triangles[h];
            let pl = mesh.triangles[al];
            let p1 = mesh.triangles[bl];

            if !is_strictly_convex_quad::<K>(mesh, p0, pr, p1, pl) {
                next_round.push(h);
                continue;
            }

            flip_edge(mesh, h, th);

            // The flip's new diagonal is `ar`<->`bl` (see `flip_edge`'s
            // `mesh.link(ar, Some(bl))`), not `h`/`th`: those are now the
            // quad's outer edges. Everything below must act on `ar`/`bl`.
            if (p0 == u && p1 == v) || (p0 == v && p1 == u) {
                mesh.constrained[ar] = mesh.constrained[ar].max(kind);
                mesh.constrained[bl] = mesh.constrained[bl].max(kind);
            } else if segments_properly_cross::<K>(pu, pv, mesh.point(p0), mesh.point(p1)) {
                next_round.push(ar);
            }
        }

        unresolved = next_round;
    }
}

/// `p0, pr, p1, pl` in that cyclic order form a strictly convex
/// quadrilateral: four signed-area checks with magnitude `> EPS`, all
/// agreeing on winding sign at every corner.
fn is_strictly_convex_quad<K: Kernel>(mesh: &Mesh<K>, p0: usize, pr: usize, p1: usize, pl: usize) -> bool {
    const EPS: f64 = 1e-9;
    let quad = [mesh.point(p0), mesh.point(pr), mesh.point(p1), mesh.point(pl)];
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let o = K::orient2d(a, b, c);
        if o.abs() <= EPS {
            return false;
        }
        if sign == 0.0 {
            sign = o.signum();
        } else if o.signum() != sign {
            return false;
        }
    }
    true
}

/// Swap the diagonal of the quadrilateral shared by triangles `a/3`
/// and `b/3`, without the hull bookkeeping Delaunay legalization needs
/// mid-insertion and this call site doesn't.
fn flip_edge<K: Kernel>(mesh: &mut Mesh<K>, a: usize, b: usize) {
    let a0 = a - a % 3;
    let ar = a0 + (a + 2) % 3;
    let b0 = b - b % 3;
    let bl = b0 + (b + 2) % 3;

    let p0 = mesh.triangles[ar];
    let p1 = mesh.triangles[bl];
    mesh.triangles[a] = p1;
    mesh.triangles[b] = p0;

    let hbl = mesh.twin(bl);
    let har = mesh.twin(ar);
    mesh.link(a, hbl);
    mesh.link(b, har);
    mesh.link(ar, Some(bl));

    mesh.constrained[a] = ConstraintKind::Unconstrained;
    mesh.constrained[b] = ConstraintKind::Unconstrained;
}

fn rebuild_vertex_out<K: Kernel>(mesh: &Mesh<K>, vertex_out: &mut [usize]) {
    for h in 0..mesh.triangles.len() {
        vertex_out[mesh.triangles[h]] = h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay;
    use crate::kernel::F64Kernel;

    fn mesh_from(points: Vec<(f64, f64)>) -> Mesh<F64Kernel> {
        let pts = points.into_iter().map(|(x, y)| F64Kernel::from_xy(x, y)).collect();
        let mut mesh = Mesh::<F64Kernel>::new(pts);
        let mut status = Status::Ok;
        delaunay::build(&mut mesh, &mut status);
        assert_eq!(status, Status::Ok);
        mesh
    }

    #[test]
    fn constraint_between_adjacent_vertices_is_a_noop_flip() {
        // A 2x2 grid; (0,0)-(1,1) is a diagonal already present after
        // Delaunay in at least one of the two triangulated squares.
        let mut mesh = mesh_from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let mut status = Status::Ok;
        constrain(&mut mesh, &[0, 2], &[ConstraintKind::Constrained], 1000, &mut status);
        assert_eq!(status, Status::Ok);
        let has_02 = mesh.edges().any(|(a, b, k)| {
            ((a == 0 && b == 2) || (a == 2 && b == 0)) && k == ConstraintKind::Constrained
        });
        assert!(has_02);
    }

    #[test]
    fn constraint_through_an_interior_point_tunnels_and_flips() {
        // A 3x3 grid of points; constrain the far diagonal, which must
        // cross at least one interior edge not already aligned with it.
        let mut mesh = mesh_from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (0.0, 2.0),
            (1.0, 2.0),
            (2.0, 2.0),
        ]);
        let mut status = Status::Ok;
        constrain(&mut mesh, &[0, 8], &[ConstraintKind::Constrained], 1000, &mut status);
        assert_eq!(status, Status::Ok);
        let has_edge = mesh.edges().any(|(a, b, k)| {
            ((a == 0 && b == 8) || (a == 8 && b == 0)) && k == ConstraintKind::Constrained
        });
        assert!(has_edge);
    }
}
