//! The halfedge mesh. Three parallel dense arrays keyed by halfedge id,
//! parameterized over the [`Kernel`] arithmetic capability, plus a
//! `constrained` array carrying per-edge state for Constrain/Plant/Refine.

use crate::kernel::Kernel;
use crate::settings::ConstraintKind;

/// A halfedge-indexed triangulation.
///
/// `triangles[h]` is the origin vertex of halfedge `h`; halfedges
/// `3t, 3t+1, 3t+2` form triangle `t` in clockwise order.
/// `halfedges[h]` is the twin halfedge, or `-1` on the mesh boundary.
/// `constrained[h]` is this halfedge's [`ConstraintKind`]; twins always
/// agree.
#[derive(Debug, Clone)]
pub struct Mesh<K: Kernel> {
    pub(crate) positions: Vec<K::Point>,
    pub(crate) triangles: Vec<usize>,
    pub(crate) halfedges: Vec<isize>,
    pub(crate) constrained: Vec<ConstraintKind>,
    /// Ordered hull loop, vertex ids. Populated by the Delaunay stage;
    /// stale (but harmless) after Plant compacts vertex ids, since no
    /// stage after Plant consults it.
    pub(crate) hull: Vec<usize>,
}

impl<K: Kernel> Mesh<K> {
    pub(crate) fn new(positions: Vec<K::Point>) -> Self {
        Mesh {
            positions,
            triangles: Vec::new(),
            halfedges: Vec::new(),
            constrained: Vec::new(),
            hull: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[K::Point] {
        &self.positions
    }

    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    pub fn halfedges(&self) -> &[isize] {
        &self.halfedges
    }

    pub fn constrained(&self) -> &[ConstraintKind] {
        &self.constrained
    }

    pub fn hull_vertices(&self) -> &[usize] {
        &self.hull
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len() / 3
    }

    /// `next(h)`: the next halfedge around the same triangle.
    #[inline]
    pub fn next_halfedge(h: usize) -> usize {
        if h % 3 == 2 {
            h - 2
        } else {
            h + 1
        }
    }

    /// `prev(h)`: the previous halfedge around the same triangle.
    #[inline]
    pub fn prev_halfedge(h: usize) -> usize {
        if h % 3 == 0 {
            h + 2
        } else {
            h - 1
        }
    }

    #[inline]
    pub fn triangle_of(h: usize) -> usize {
        h / 3
    }

    /// The three origin vertices of triangle `t`, in clockwise order.
    pub fn triangle_vertices(&self, t: usize) -> [usize; 3] {
        let h = t * 3;
        [self.triangles[h], self.triangles[h + 1], self.triangles[h + 2]]
    }

    pub fn point(&self, v: usize) -> K::Point {
        self.positions[v]
    }

    /// Link two halfedges as twins. Passing `None` marks `a` as boundary.
    pub(crate) fn link(&mut self, a: usize, b: Option<usize>) {
        self.halfedges[a] = b.map(|b| b as isize).unwrap_or(-1);
        if let Some(b) = b {
            self.halfedges[b] = a as isize;
        }
    }

    pub(crate) fn twin(&self, h: usize) -> Option<usize> {
        let t = self.halfedges[h];
        if t < 0 {
            None
        } else {
            Some(t as usize)
        }
    }

    /// Every undirected edge exactly once, with its [`ConstraintKind`].
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, ConstraintKind)> + '_ {
        self.halfedges.iter().enumerate().filter_map(move |(h, twin)| {
            if *twin >= 0 && (*twin as usize) < h {
                None
            } else {
                let p0 = self.triangles[h];
                let p1 = self.triangles[Self::next_halfedge(h)];
                Some((p0, p1, self.constrained[h]))
            }
        })
    }

    /// `(min interior angle in radians, 2x signed area)` for triangle
    /// `t`. Used by Refine's bad-triangle test and exposed publicly for
    /// callers that want to inspect mesh quality directly.
    pub fn triangle_quality(&self, t: usize) -> (f64, f64) {
        let [a, b, c] = self.triangle_vertices(t);
        let (pa, pb, pc) = (self.point(a), self.point(b), self.point(c));
        let area2 = K::orient2d(pa, pb, pc).abs();

        let (ax, ay) = (K::x(pa), K::y(pa));
        let (bx, by) = (K::x(pb), K::y(pb));
        let (cx, cy) = (K::x(pc), K::y(pc));

        let edge = |x0: f64, y0: f64, x1: f64, y1: f64| {
            let dx = x1 - x0;
            let dy = y1 - y0;
            let len = (dx * dx + dy * dy).sqrt();
            (dx / len, dy / len)
        };

        // Interior angle at `p` via the dot product of the two unit edge
        // vectors leaving it.
        let angle_between = |p: (f64, f64), q: (f64, f64), r: (f64, f64)| -> f64 {
            let (ux, uy) = edge(p.0, p.1, q.0, q.1);
            let (vx, vy) = edge(p.0, p.1, r.0, r.1);
            (ux * vx + uy * vy).clamp(-1.0, 1.0).acos()
        };

        let angle_a = angle_between((ax, ay), (bx, by), (cx, cy));
        let angle_b = angle_between((bx, by), (cx, cy), (ax, ay));
        let angle_c = angle_between((cx, cy), (ax, ay), (bx, by));
        let min_angle = angle_a.min(angle_b).min(angle_c);

        (min_angle, area2)
    }

    /// Drop every triangle marked `true` in `remove`, remapping triangle
    /// and vertex indices so the arrays stay dense (shared by Plant's
    /// region-removal compaction and Refine's dead-triangle sweep).
    pub(crate) fn compact(&mut self, remove: &[bool]) {
        let old_t = self.num_triangles();
        let mut tri_remap = vec![usize::MAX; old_t];
        let mut new_t = 0usize;
        for t in 0..old_t {
            if !remove[t] {
                tri_remap[t] = new_t;
                new_t += 1;
            }
        }

        let mut triangles = vec![0usize; new_t * 3];
        let mut halfedges = vec![-1isize; new_t * 3];
        let mut constrained = vec![ConstraintKind::Unconstrained; new_t * 3];

        for t in 0..old_t {
            if remove[t] {
                continue;
            }
            let dst_t = tri_remap[t];
            for k in 0..3 {
                let h = t * 3 + k;
                let dst_h = dst_t * 3 + k;
                triangles[dst_h] = self.triangles[h];
                constrained[dst_h] = self.constrained[h];
                halfedges[dst_h] = match self.twin(h) {
                    Some(th) if !remove[Self::triangle_of(th)] => {
                        let dst_nt = tri_remap[Self::triangle_of(th)];
                        (dst_nt * 3 + th % 3) as isize
                    }
                    _ => -1,
                };
            }
        }

        let mut used = vec![false; self.positions.len()];
        for &v in &triangles {
            used[v] = true;
        }
        let mut vert_remap = vec![usize::MAX; self.positions.len()];
        let mut positions = Vec::new();
        for (v, &is_used) in used.iter().enumerate() {
            if is_used {
                vert_remap[v] = positions.len();
                positions.push(self.positions[v]);
            }
        }
        for v in triangles.iter_mut() {
            *v = vert_remap[*v];
        }

        self.positions = positions;
        self.triangles = triangles;
        self.halfedges = halfedges;
        self.constrained = constrained;
        self.hull.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::F64Kernel;

    fn single_triangle() -> Mesh<F64Kernel> {
        let pts = vec![
            F64Kernel::from_xy(0.0, 0.0),
            F64Kernel::from_xy(1.0, 0.0),
            F64Kernel::from_xy(0.0, 1.0),
        ];
        let mut m = Mesh::<F64Kernel>::new(pts);
        m.triangles = vec![0, 2, 1];
        m.halfedges = vec![-1, -1, -1];
        m.constrained = vec![ConstraintKind::Unconstrained; 3];
        m
    }

    #[test]
    fn next_prev_roundtrip() {
        for h in 0..3 {
            assert_eq!(Mesh::<F64Kernel>::prev_halfedge(Mesh::<F64Kernel>::next_halfedge(h)), h);
        }
    }

    #[test]
    fn quality_of_right_isoceles_triangle() {
        let m = single_triangle();
        let (min_angle, area2) = m.triangle_quality(0);
        assert!((area2 - 1.0).abs() < 1e-9);
        assert!((min_angle - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn edges_iterator_yields_each_edge_once() {
        let m = single_triangle();
        let edges: Vec<_> = m.edges().collect();
        assert_eq!(edges.len(), 3);
    }
}
