//! Stage 5: region removal ("planting"). Flood-fills the mesh from hole
//! seeds and/or the convex hull, deciding which triangles fall outside
//! the intended domain, then compacts the triangle/vertex arrays to drop
//! them via a full index remap (removal, unlike a tail-only truncation,
//! can leave gaps anywhere in the array).

use crate::kernel::{Kernel, PointLocation};
use crate::mesh::Mesh;
use crate::settings::{ConstraintKind, Settings};
use crate::status::Status;

pub(crate) fn plant<K: Kernel>(mesh: &mut Mesh<K>, hole_seeds: &[K::Point], settings: &Settings, _status: &mut Status) {
    if mesh.num_triangles() == 0 {
        return;
    }

    let mut remove = vec![false; mesh.num_triangles()];

    // A seed that lands outside every triangle is a no-op, not an error.
    for &seed in hole_seeds {
        if let Some(t) = locate_triangle(mesh, seed) {
            flood_fill(mesh, &mut remove, t, |k| k == ConstraintKind::Unconstrained);
        }
    }

    if settings.restore_boundary {
        restore_boundary(mesh, &mut remove);
    }

    if settings.auto_holes_and_boundary {
        even_odd_fill(mesh, &mut remove);
    }

    mesh.compact(&remove);
}

/// First triangle (by index order) containing `p`, on the boundary
/// counting as containing it.
fn locate_triangle<K: Kernel>(mesh: &Mesh<K>, p: K::Point) -> Option<usize> {
    (0..mesh.num_triangles()).find(|&t| {
        let [a, b, c] = mesh.triangle_vertices(t);
        !matches!(
            K::point_in_triangle(p, mesh.point(a), mesh.point(b), mesh.point(c)),
            PointLocation::Outside
        )
    })
}

/// BFS from `start`, marking every triangle reached `true` in `remove`.
/// Crosses a halfedge `h` only when `cross(mesh.constrained[h])` holds.
fn flood_fill<K: Kernel>(mesh: &Mesh<K>, remove: &mut [bool], start: usize, cross: impl Fn(ConstraintKind) -> bool) {
    if remove[start] {
        return;
    }
    let mut queue = vec![start];
    remove[start] = true;
    while let Some(t) = queue.pop() {
        for k in 0..3 {
            let h = t * 3 + k;
            if !cross(mesh.constrained[h]) {
                continue;
            }
            if let Some(twin) = mesh.twin(h) {
                let nt = Mesh::<K>::triangle_of(twin);
                if !remove[nt] {
                    remove[nt] = true;
                    queue.push(nt);
                }
            }
        }
    }
}

/// Peel away triangles reachable from the convex hull without crossing
/// a constraint, restoring concavities the convex-hull triangulation
/// filled in.
fn restore_boundary<K: Kernel>(mesh: &Mesh<K>, remove: &mut [bool]) {
    let hull_triangles: Vec<usize> = (0..mesh.triangles.len())
        .filter(|&h| mesh.halfedges[h] < 0)
        .map(|h| Mesh::<K>::triangle_of(h))
        .collect();
    for t in hull_triangles {
        flood_fill(mesh, remove, t, |k| k == ConstraintKind::Unconstrained);
    }
}

/// Even-odd nesting fill (auto mode): flood from the unbounded exterior
/// with a crossing count, toggling in/out state whenever a constrained
/// edge is crossed. Triangles at even depth (the unbounded exterior
/// itself, or inside a nested hole) are removed.
///
/// The unbounded exterior is depth 0 by definition and is never itself a
/// triangle; every hull (boundary) halfedge is a crossing out of it into
/// the mesh, so hull triangles seed at depth 1 unconditionally (entering
/// the mesh at all counts as the first crossing, whether or not that
/// hull edge happens to carry a constraint) — not at depth 0, which
/// would wrongly treat the domain's outer ring as exterior.
fn even_odd_fill<K: Kernel>(mesh: &Mesh<K>, remove: &mut [bool]) {
    let n = mesh.num_triangles();
    let mut depth = vec![usize::MAX; n];
    let mut queue = std::collections::VecDeque::new();

    for h in 0..mesh.triangles.len() {
        if mesh.halfedges[h] < 0 {
            let t = Mesh::<K>::triangle_of(h);
            if depth[t] == usize::MAX {
                depth[t] = 1;
                queue.push_back(t);
            }
        }
    }

    while let Some(t) = queue.pop_front() {
        for k in 0..3 {
            let h = t * 3 + k;
            let Some(twin) = mesh.twin(h) else { continue };
            let nt = Mesh::<K>::triangle_of(twin);
            if depth[nt] != usize::MAX {
                continue;
            }
            let bump = if mesh.constrained[h] == ConstraintKind::Unconstrained { 0 } else { 1 };
            depth[nt] = depth[t] + bump;
            queue.push_back(nt);
        }
    }

    for t in 0..n {
        if depth[t] != usize::MAX && depth[t] % 2 == 0 {
            remove[t] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay;
    use crate::kernel::F64Kernel;

    fn grid_mesh() -> Mesh<F64Kernel> {
        let pts = (0..3)
            .flat_map(|y| (0..3).map(move |x| (x as f64, y as f64)))
            .map(|(x, y)| F64Kernel::from_xy(x, y))
            .collect();
        let mut mesh = Mesh::<F64Kernel>::new(pts);
        let mut status = Status::Ok;
        delaunay::build(&mut mesh, &mut status);
        assert_eq!(status, Status::Ok);
        mesh
    }

    #[test]
    fn hole_seed_outside_mesh_is_a_no_op() {
        let mut mesh = grid_mesh();
        let before = mesh.num_triangles();
        let mut status = Status::Ok;
        plant(&mut mesh, &[F64Kernel::from_xy(100.0, 100.0)], &Settings::default(), &mut status);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.num_triangles(), before);
    }

    #[test]
    fn hole_seed_inside_unconstrained_mesh_removes_everything() {
        // With no constraint edges every interior edge is Unconstrained,
        // so a single hole seed's flood fill reaches the whole mesh.
        let mut mesh = grid_mesh();
        let before = mesh.num_triangles();
        assert!(before > 0);
        let mut status = Status::Ok;
        plant(&mut mesh, &[F64Kernel::from_xy(0.5, 0.5)], &Settings::default(), &mut status);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.num_triangles(), 0);
    }

    #[test]
    fn no_holes_and_no_flags_keeps_the_mesh_intact() {
        let mut mesh = grid_mesh();
        let before = mesh.num_triangles();
        let mut status = Status::Ok;
        plant(&mut mesh, &[], &Settings::default(), &mut status);
        assert_eq!(status, Status::Ok);
        assert_eq!(mesh.num_triangles(), before);
    }

    #[test]
    fn auto_mode_removes_a_nested_hole_without_an_explicit_seed() {
        // Outer square plus an inner square marked as a hole boundary.
        // Auto mode must remove the inner square's interior triangles
        // (even depth = 2 from the hull) while keeping the annulus
        // between the two loops (odd depth = 1), with no hole seed at
        // all driving the decision.
        let pts = vec![
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (0.0, 3.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
        ]
        .into_iter()
        .map(|(x, y)| F64Kernel::from_xy(x, y))
        .collect();
        let mut mesh = Mesh::<F64Kernel>::new(pts);
        let mut status = Status::Ok;
        delaunay::build(&mut mesh, &mut status);
        assert_eq!(status, Status::Ok);

        let edges = [0, 1, 1, 2, 2, 3, 3, 0, 4, 5, 5, 6, 6, 7, 7, 4];
        let kinds = vec![
            ConstraintKind::Unconstrained,
            ConstraintKind::Unconstrained,
            ConstraintKind::Unconstrained,
            ConstraintKind::Unconstrained,
            ConstraintKind::ConstrainedAndHoleBoundary,
            ConstraintKind::ConstrainedAndHoleBoundary,
            ConstraintKind::ConstrainedAndHoleBoundary,
            ConstraintKind::ConstrainedAndHoleBoundary,
        ];
        crate::constrain::constrain(&mut mesh, &edges, &kinds, 1000, &mut status);
        assert_eq!(status, Status::Ok);

        let before_inner: Vec<usize> = (0..mesh.num_triangles())
            .filter(|&t| {
                let [a, b, c] = mesh.triangle_vertices(t);
                let cx = (crate::kernel::F64Kernel::x(mesh.point(a)) + crate::kernel::F64Kernel::x(mesh.point(b)) + crate::kernel::F64Kernel::x(mesh.point(c))) / 3.0;
                let cy = (crate::kernel::F64Kernel::y(mesh.point(a)) + crate::kernel::F64Kernel::y(mesh.point(b)) + crate::kernel::F64Kernel::y(mesh.point(c))) / 3.0;
                (1.0..2.0).contains(&cx) && (1.0..2.0).contains(&cy)
            })
            .collect();
        assert!(!before_inner.is_empty());

        let settings = Settings::builder().auto_holes_and_boundary(true).build();
        plant(&mut mesh, &[], &settings, &mut status);
        assert_eq!(status, Status::Ok);
        assert!(mesh.num_triangles() > 0);

        for t in 0..mesh.num_triangles() {
            let [a, b, c] = mesh.triangle_vertices(t);
            let cx = (crate::kernel::F64Kernel::x(mesh.point(a)) + crate::kernel::F64Kernel::x(mesh.point(b)) + crate::kernel::F64Kernel::x(mesh.point(c))) / 3.0;
            let cy = (crate::kernel::F64Kernel::y(mesh.point(a)) + crate::kernel::F64Kernel::y(mesh.point(b)) + crate::kernel::F64Kernel::y(mesh.point(c))) / 3.0;
            assert!(!((1.0..2.0).contains(&cx) && (1.0..2.0).contains(&cy)), "inner square triangle survived auto planting");
        }
    }
}
