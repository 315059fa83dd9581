//! `TriangulationBuilder`: an incremental, ergonomic way to assemble a
//! run's inputs before calling [`crate::triangulate`] once, in the
//! style of an incremental `insert`/`add_constraint` calling convention
//! but adapted to this crate's batch pipeline: nothing is triangulated
//! until [`TriangulationBuilder::build`] runs, so there is no live mesh
//! to query mid-construction.

use crate::kernel::Kernel;
use crate::settings::{ConstraintKind, Settings};
use crate::{triangulate, Output};

/// Accumulates `positions`/`constraint_edges`/`hole_seeds`/[`Settings`]
/// for a single [`crate::triangulate`] call.
#[derive(Debug, Clone)]
pub struct TriangulationBuilder<K: Kernel> {
    positions: Vec<K::Point>,
    constraint_edges: Vec<usize>,
    constraint_edge_types: Vec<ConstraintKind>,
    hole_seeds: Vec<K::Point>,
    settings: Settings,
}

impl<K: Kernel> Default for TriangulationBuilder<K> {
    fn default() -> Self {
        TriangulationBuilder {
            positions: Vec::new(),
            constraint_edges: Vec::new(),
            constraint_edge_types: Vec::new(),
            hole_seeds: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl<K: Kernel> TriangulationBuilder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point, returning its index for use in [`Self::constraint`].
    pub fn insert(&mut self, p: K::Point) -> usize {
        let idx = self.positions.len();
        self.positions.push(p);
        idx
    }

    pub fn insert_all(&mut self, points: impl IntoIterator<Item = K::Point>) {
        for p in points {
            self.insert(p);
        }
    }

    /// Add a constraint edge between two already-inserted point indices,
    /// defaulting to [`ConstraintKind::Constrained`]. A batch call to
    /// [`crate::triangulate`] with no `constraint_edge_types` treats
    /// every edge as hole-boundary instead; this per-call default
    /// differs because a builder caller names the kind explicitly one
    /// edge at a time instead of handing over a whole parallel array —
    /// see [`Self::hole_boundary`] for the other kind.
    pub fn constraint(&mut self, u: usize, v: usize) -> &mut Self {
        self.constraint_edges.push(u);
        self.constraint_edges.push(v);
        self.constraint_edge_types.push(ConstraintKind::Constrained);
        self
    }

    /// Add a constraint edge that also bounds a hole/outer region.
    pub fn hole_boundary(&mut self, u: usize, v: usize) -> &mut Self {
        self.constraint_edges.push(u);
        self.constraint_edges.push(v);
        self.constraint_edge_types.push(ConstraintKind::ConstrainedAndHoleBoundary);
        self
    }

    pub fn hole_seed(&mut self, p: K::Point) -> &mut Self {
        self.hole_seeds.push(p);
        self
    }

    pub fn settings(&mut self, settings: Settings) -> &mut Self {
        self.settings = settings;
        self
    }

    /// Run [`crate::triangulate`] over everything accumulated so far.
    pub fn build(&self) -> Output<K> {
        triangulate::<K>(&self.positions, &self.constraint_edges, Some(&self.constraint_edge_types), &self.hole_seeds, &self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::F64Kernel;
    use crate::status::Status;

    #[test]
    fn builder_matches_calling_triangulate_directly() {
        let mut b = TriangulationBuilder::<F64Kernel>::new();
        let a = b.insert(F64Kernel::from_xy(0.0, 0.0));
        let c = b.insert(F64Kernel::from_xy(1.0, 0.0));
        let d = b.insert(F64Kernel::from_xy(0.0, 1.0));
        b.constraint(a, c);
        let out = b.build();
        assert_eq!(out.status, Status::Ok);
        assert_eq!(out.mesh.num_triangles(), 1);
        let _ = d;
    }

    #[test]
    fn hole_boundary_sets_the_stronger_constraint_kind() {
        let mut b = TriangulationBuilder::<F64Kernel>::new();
        let pts = [(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0), (1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)];
        let idx: Vec<usize> = pts.iter().map(|&(x, y)| b.insert(F64Kernel::from_xy(x, y))).collect();
        b.constraint(idx[0], idx[1]).constraint(idx[1], idx[2]).constraint(idx[2], idx[3]).constraint(idx[3], idx[0]);
        b.hole_boundary(idx[4], idx[5]).hole_boundary(idx[5], idx[6]).hole_boundary(idx[6], idx[7]).hole_boundary(idx[7], idx[4]);
        b.hole_seed(F64Kernel::from_xy(1.5, 1.5));
        let out = b.build();
        assert_eq!(out.status, Status::Ok);
        assert!(out.mesh.num_triangles() > 0);
    }
}
