//! Stage 6: Ruppert refinement. Alternates between splitting encroached
//! constrained segments (concentric-shell, via `Kernel::alpha`) and
//! inserting circumcenters of triangles that fail the
//! minimum-angle/maximum-area thresholds, each insertion done as a
//! Bowyer-Watson cavity retriangulation that never crosses a
//! constrained edge.
//!
//! Keeping `segment_queue`/`triangle_queue` valid as cavity
//! retriangulation kills and appends triangles mid-run is handled via a
//! scan-based `dead` flag rather than a generation counter: queue
//! entries are indices that may go stale (point at a dead triangle, or a
//! halfedge whose constraint was already resolved); every pop re-checks
//! liveness and silently discards stale entries. Simpler to reason about
//! than threading generation numbers through every queue push, at the
//! cost of the occasional wasted pop.

use std::collections::VecDeque;

use crate::kernel::Kernel;
use crate::mesh::Mesh;
use crate::settings::{ConstraintKind, Settings};
use crate::status::Status;

pub(crate) fn refine<K: Kernel>(mesh: &mut Mesh<K>, settings: &Settings, status: &mut Status) {
    if !settings.refine_mesh {
        return;
    }
    if !K::supports_refinement() {
        status.record(Status::RefinementNotSupportedForCoordinateType);
        return;
    }
    if mesh.num_triangles() == 0 {
        return;
    }

    let input_vertex_count = mesh.positions.len();

    let mut dead = vec![false; mesh.num_triangles()];
    let mut segment_queue = initial_encroached_segments(mesh);
    let mut triangle_queue: VecDeque<usize> =
        (0..mesh.num_triangles()).filter(|&t| is_bad_triangle::<K>(mesh, t, settings)).collect();

    let budget = settings.sloan_max_iters;
    let mut iterations = 0u64;

    loop {
        if let Some(h) = segment_queue.pop_front() {
            if h >= mesh.halfedges.len() || dead[Mesh::<K>::triangle_of(h)] || mesh.constrained[h] == ConstraintKind::Unconstrained {
                continue;
            }

            iterations += 1;
            if iterations > budget {
                status.record(Status::SloanMaxItersExceeded);
                break;
            }

            let a = mesh.triangles[h];
            let b = mesh.triangles[Mesh::<K>::next_halfedge(h)];
            let kind = mesh.constrained[h];
            let Some(split) = split_point::<K>(mesh, a, b, input_vertex_count) else {
                status.record(Status::IntegersDoNotSupportMeshRefinement);
                break;
            };

            let p = split_constrained_edge(mesh, &mut dead, h, split, kind);
            requeue_around_vertex(mesh, &dead, p, settings, &mut segment_queue, &mut triangle_queue);
            continue;
        }

        let Some(t) = triangle_queue.pop_front() else {
            break;
        };
        if t >= dead.len() || dead[t] || !is_bad_triangle::<K>(mesh, t, settings) {
            continue;
        }

        iterations += 1;
        if iterations > budget {
            status.record(Status::SloanMaxItersExceeded);
            break;
        }

        let [a, b, c] = mesh.triangle_vertices(t);
        let Some((cx, cy)) = K::circum_center(mesh.point(a), mesh.point(b), mesh.point(c)) else {
            continue;
        };
        let center = K::from_xy(cx, cy);

        if let Some(h) = encroached_segment::<K>(mesh, center) {
            triangle_queue.push_back(t);
            segment_queue.push_back(h);
            continue;
        }

        let p = insert_circumcenter(mesh, &mut dead, t, center);
        requeue_around_vertex(mesh, &dead, p, settings, &mut segment_queue, &mut triangle_queue);
    }

    mesh.compact(&dead);
}

fn is_bad_triangle<K: Kernel>(mesh: &Mesh<K>, t: usize, settings: &Settings) -> bool {
    let (min_angle, area2) = mesh.triangle_quality(t);
    min_angle < settings.refinement.angle || area2 / 2.0 > settings.refinement.area
}

fn is_encroached<K: Kernel>(a: K::Point, b: K::Point, p: K::Point) -> bool {
    let da = (K::x(p) - K::x(a), K::y(p) - K::y(a));
    let db = (K::x(p) - K::x(b), K::y(p) - K::y(b));
    da.0 * db.0 + da.1 * db.1 < 0.0
}

fn initial_encroached_segments<K: Kernel>(mesh: &Mesh<K>) -> VecDeque<usize> {
    let mut q = VecDeque::new();
    for h in 0..mesh.halfedges.len() {
        if mesh.constrained[h] == ConstraintKind::Unconstrained {
            continue;
        }
        if let Some(t) = mesh.twin(h) {
            if (t as usize) < h {
                continue;
            }
        }
        let a = mesh.triangles[h];
        let b = mesh.triangles[Mesh::<K>::next_halfedge(h)];
        let (pa, pb) = (mesh.point(a), mesh.point(b));
        let encroached = (0..mesh.positions.len()).any(|v| v != a && v != b && is_encroached::<K>(pa, pb, mesh.point(v)));
        if encroached {
            q.push_back(h);
        }
    }
    q
}

fn encroached_segment<K: Kernel>(mesh: &Mesh<K>, p: K::Point) -> Option<usize> {
    for h in 0..mesh.halfedges.len() {
        if mesh.constrained[h] == ConstraintKind::Unconstrained {
            continue;
        }
        if let Some(t) = mesh.twin(h) {
            if (t as usize) < h {
                continue;
            }
        }
        let a = mesh.point(mesh.triangles[h]);
        let b = mesh.point(mesh.triangles[Mesh::<K>::next_halfedge(h)]);
        if is_encroached::<K>(a, b, p) {
            return Some(h);
        }
    }
    None
}

/// Reference concentric-shell radius.
const SHELL_REFERENCE_RADIUS: f64 = 0.001;

/// Concentric-shell split point for segment `(a, b)`. If both endpoints
/// are input vertices, or both are earlier Steiner points, split at the
/// midpoint; otherwise the split point is snapped to the shell grid
/// centered on whichever endpoint is an input vertex.
fn split_point<K: Kernel>(mesh: &Mesh<K>, a: usize, b: usize, input_vertex_count: usize) -> Option<K::Point> {
    let (pa, pb) = (mesh.point(a), mesh.point(b));
    let a_is_input = a < input_vertex_count;
    let b_is_input = b < input_vertex_count;

    if a_is_input == b_is_input {
        return Some(K::lerp(pa, pb, 0.5));
    }

    let (input_end, steiner_end) = if a_is_input { (pa, pb) } else { (pb, pa) };
    let d_sq = K::distance_sq(input_end, steiner_end);
    let alpha = K::alpha(SHELL_REFERENCE_RADIUS, d_sq)?;
    Some(K::lerp(input_end, steiner_end, alpha))
}

/// Every live triangle whose circumcircle contains `p`, flood-filled
/// from `start` (the Bowyer-Watson cavity). Never crosses a constrained
/// edge, so a cavity never spans both sides of a segment.
fn collect_cavity<K: Kernel>(mesh: &Mesh<K>, dead: &[bool], start: usize, p: K::Point) -> Vec<usize> {
    let mut in_cavity = vec![false; mesh.num_triangles()];
    in_cavity[start] = true;
    let mut cavity = vec![start];
    let mut stack = vec![start];

    while let Some(t) = stack.pop() {
        for k in 0..3 {
            let h = t * 3 + k;
            if mesh.constrained[h] != ConstraintKind::Unconstrained {
                continue;
            }
            let Some(twin) = mesh.twin(h) else { continue };
            let nt = Mesh::<K>::triangle_of(twin);
            if dead[nt] || in_cavity[nt] {
                continue;
            }
            let [a, b, c] = mesh.triangle_vertices(nt);
            if K::in_circle(mesh.point(a), mesh.point(b), mesh.point(c), p) {
                in_cavity[nt] = true;
                cavity.push(nt);
                stack.push(nt);
            }
        }
    }
    cavity
}

type BoundaryEdge = (usize, usize, ConstraintKind, Option<usize>);

fn cavity_boundary<K: Kernel>(mesh: &Mesh<K>, cavity: &[usize]) -> Vec<BoundaryEdge> {
    let mut boundary = Vec::new();
    for &t in cavity {
        for k in 0..3 {
            let h = t * 3 + k;
            let interior = matches!(mesh.twin(h), Some(th) if cavity.contains(&Mesh::<K>::triangle_of(th)));
            if interior {
                continue;
            }
            let origin = mesh.triangles[h];
            let dest = mesh.triangles[Mesh::<K>::next_halfedge(h)];
            boundary.push((origin, dest, mesh.constrained[h], mesh.twin(h)));
        }
    }
    boundary
}

/// Walk the boundary edges into a single cyclic sequence starting
/// anywhere, by chaining `dest(i) == origin(i+1)`.
fn order_boundary_loop(boundary: &[BoundaryEdge]) -> Vec<BoundaryEdge> {
    use std::collections::HashMap;
    let by_origin: HashMap<usize, BoundaryEdge> = boundary.iter().map(|&e| (e.0, e)).collect();

    let mut ordered = Vec::with_capacity(boundary.len());
    let start = boundary[0].0;
    let mut cur = start;
    loop {
        let e = by_origin[&cur];
        ordered.push(e);
        cur = e.1;
        if cur == start {
            break;
        }
    }
    ordered
}

/// Walk the boundary edges of an amphitheater cavity (one whose segment
/// edge has already been excluded from `boundary`) into a single open
/// chain. Unlike [`order_boundary_loop`] this does not close: the chain
/// starts at whichever vertex is an origin but never a destination in
/// `boundary` (the vertex the excluded segment edge used to point away
/// from) and ends at the excluded edge's other endpoint.
fn order_boundary_chain(boundary: &[BoundaryEdge]) -> Vec<BoundaryEdge> {
    use std::collections::HashMap;
    let by_origin: HashMap<usize, BoundaryEdge> = boundary.iter().map(|&e| (e.0, e)).collect();
    let dests: std::collections::HashSet<usize> = boundary.iter().map(|&e| e.1).collect();
    let start = boundary.iter().map(|&e| e.0).find(|o| !dests.contains(o)).expect("open chain has exactly one dangling origin");

    let mut ordered = Vec::with_capacity(boundary.len());
    let mut cur = start;
    for _ in 0..boundary.len() {
        let e = by_origin[&cur];
        ordered.push(e);
        cur = e.1;
    }
    ordered
}

/// Replace `cavity`'s triangles with a star fan from `p_vertex` to each
/// boundary edge. New triangles are appended rather than reusing freed
/// slots; the final `Mesh::compact` sweep reclaims the dead ones.
///
/// `closed` selects between a full star polygon (the boundary loop wraps
/// around, every spoke from `p_vertex` is internally twinned) and an open
/// amphitheater chain (no wraparound; the two end spokes are left
/// unlinked and returned as `(first_spoke, last_spoke)` for the caller to
/// twin against the matching chain on the other side of a split segment,
/// or leave as mesh boundary).
fn retriangulate_cavity<K: Kernel>(
    mesh: &mut Mesh<K>,
    dead: &mut Vec<bool>,
    cavity: &[usize],
    p_vertex: usize,
    loop_edges: &[BoundaryEdge],
    closed: bool,
) -> (usize, usize) {
    for &t in cavity {
        dead[t] = true;
    }

    let base = mesh.triangles.len();
    for &(o, d, kind, outside) in loop_edges {
        mesh.triangles.push(o);
        mesh.triangles.push(d);
        mesh.triangles.push(p_vertex);
        mesh.halfedges.push(-1);
        mesh.halfedges.push(-1);
        mesh.halfedges.push(-1);
        mesh.constrained.push(kind);
        mesh.constrained.push(ConstraintKind::Unconstrained);
        mesh.constrained.push(ConstraintKind::Unconstrained);
        dead.push(false);

        let t_h0 = mesh.triangles.len() - 3;
        mesh.link(t_h0, outside);
    }

    let n = loop_edges.len();
    let range_start = if closed { 0 } else { 1 };
    for i in range_start..n {
        let t_h0 = base + i * 3;
        let prev_i = (i + n - 1) % n;
        let prev_h0 = base + prev_i * 3;
        mesh.link(t_h0 + 2, Some(prev_h0 + 1));
    }

    (base + 2, base + (n - 1) * 3 + 1)
}

fn mark_edge_constrained<K: Kernel>(mesh: &mut Mesh<K>, u: usize, v: usize, kind: ConstraintKind) {
    for h in 0..mesh.triangles.len() {
        let o = mesh.triangles[h];
        let d = mesh.triangles[Mesh::<K>::next_halfedge(h)];
        if (o == u && d == v) || (o == v && d == u) {
            mesh.constrained[h] = mesh.constrained[h].max(kind);
            if let Some(t) = mesh.twin(h) {
                mesh.constrained[t] = mesh.constrained[t].max(kind);
            }
        }
    }
}

/// Split the constrained halfedge `h` at `split` via the concentric-shell
/// step: retriangulate the cavity on each side independently (the
/// segment itself blocks the flood fill from mixing them), then re-mark
/// the two new sub-segments with `kind`.
///
/// The segment edge `a-b` itself is excluded from each side's fan — `p`
/// lies exactly on it, so fanning to it would produce a zero-area
/// triangle — and each side instead retriangulates an open amphitheater
/// chain. The two dangling spokes that used to meet at the segment edge
/// (`a-p` and `p-b`) are twinned directly across the two sides instead.
fn split_constrained_edge<K: Kernel>(mesh: &mut Mesh<K>, dead: &mut Vec<bool>, h: usize, split: K::Point, kind: ConstraintKind) -> usize {
    let a = mesh.triangles[h];
    let b = mesh.triangles[Mesh::<K>::next_halfedge(h)];

    let p_vertex = mesh.positions.len();
    mesh.positions.push(split);

    let t_left = Mesh::<K>::triangle_of(h);
    let cavity_left = collect_cavity(mesh, dead, t_left, split);
    let boundary_left: Vec<BoundaryEdge> = cavity_boundary(mesh, &cavity_left).into_iter().filter(|&(o, d, _, _)| !(o == a && d == b)).collect();
    let chain_left = order_boundary_chain(&boundary_left);
    // Chain runs b -> ... -> a (the segment edge it replaces ran a -> b),
    // so the first spoke is p-b and the last is a-p.
    let (pb_left, ap_left) = retriangulate_cavity(mesh, dead, &cavity_left, p_vertex, &chain_left, false);

    if let Some(twin) = mesh.twin(h) {
        let t_right = Mesh::<K>::triangle_of(twin);
        if !dead[t_right] {
            let cavity_right = collect_cavity(mesh, dead, t_right, split);
            let boundary_right: Vec<BoundaryEdge> = cavity_boundary(mesh, &cavity_right).into_iter().filter(|&(o, d, _, _)| !(o == b && d == a)).collect();
            let chain_right = order_boundary_chain(&boundary_right);
            // The right side's excluded edge ran b -> a, so its chain
            // runs a -> ... -> b: first spoke p-a, last spoke b-p.
            let (pa_right, bp_right) = retriangulate_cavity(mesh, dead, &cavity_right, p_vertex, &chain_right, false);

            // p-b (left) twins b-p (right); a-p (left) twins p-a (right).
            mesh.link(pb_left, Some(bp_right));
            mesh.link(ap_left, Some(pa_right));
        }
    }

    mark_edge_constrained(mesh, a, p_vertex, kind);
    mark_edge_constrained(mesh, p_vertex, b, kind);
    p_vertex
}

fn insert_circumcenter<K: Kernel>(mesh: &mut Mesh<K>, dead: &mut Vec<bool>, t: usize, p: K::Point) -> usize {
    let p_vertex = mesh.positions.len();
    mesh.positions.push(p);

    let cavity = collect_cavity(mesh, dead, t, p);
    let loop_edges = order_boundary_loop(&cavity_boundary(mesh, &cavity));
    retriangulate_cavity(mesh, dead, &cavity, p_vertex, &loop_edges, true);
    p_vertex
}

/// After inserting `v`, requeue any newly created triangle that's bad
/// and any constrained segment `v` now encroaches on.
fn requeue_around_vertex<K: Kernel>(
    mesh: &Mesh<K>,
    dead: &[bool],
    v: usize,
    settings: &Settings,
    segment_queue: &mut VecDeque<usize>,
    triangle_queue: &mut VecDeque<usize>,
) {
    let p = mesh.point(v);
    for t in 0..mesh.num_triangles() {
        if dead[t] {
            continue;
        }
        let verts = mesh.triangle_vertices(t);
        if !verts.contains(&v) {
            continue;
        }
        if is_bad_triangle::<K>(mesh, t, settings) {
            triangle_queue.push_back(t);
        }
        for k in 0..3 {
            let h = t * 3 + k;
            if mesh.constrained[h] == ConstraintKind::Unconstrained {
                continue;
            }
            let a = mesh.point(mesh.triangles[h]);
            let b = mesh.point(mesh.triangles[Mesh::<K>::next_halfedge(h)]);
            if is_encroached::<K>(a, b, p) {
                segment_queue.push_back(h);
            }
        }
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
    fn disabled_refinement_is_a_noop() {
        let mut mesh = mesh_from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let before = mesh.num_triangles();
        let mut status = Status::Ok;
        refine(&mut mesh, &Settings::default(), &mut status);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.num_triangles(), before);
    }

    #[test]
    fn large_sliver_triangle_gets_refined() {
        // A single very thin, oversized triangle violates both the
        // default angle and area thresholds and must pick up Steiner
        // points.
        let mut mesh = mesh_from(vec![(0.0, 0.0), (20.0, 0.0), (20.0, 1.0)]);
        let settings = Settings::builder().refine_mesh(true).refinement(1.0, 10.0_f64.to_radians()).build();
        let mut status = Status::Ok;
        refine(&mut mesh, &settings, &mut status);
        assert_eq!(status, Status::Ok);
        assert!(mesh.num_triangles() > 1);
    }

    #[test]
    fn integer_kernel_refinement_is_rejected() {
        use crate::kernel::I64Kernel;
        let pts = vec![(0, 0), (10, 0), (0, 10)].into_iter().map(|(x, y)| (x as i64, y as i64)).collect();
        let mut mesh = Mesh::<I64Kernel>::new(pts);
        let mut status = Status::Ok;
        delaunay::build(&mut mesh, &mut status);
        assert_eq!(status, Status::Ok);
        let settings = Settings::builder().refine_mesh(true).build();
        refine(&mut mesh, &settings, &mut status);
        assert_eq!(status, Status::RefinementNotSupportedForCoordinateType);
    }
}
