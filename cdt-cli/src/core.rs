//! JSON <-> `cdt` conversion, split out of `main.rs` (grounded on
//! `spade-cli`'s `main.rs`/`core.rs` split: `main.rs` only does stdio,
//! this module does the actual triangulation call and shape conversion).

use cdt::{triangulate, ConstraintKind, F64Kernel, Kernel, Settings};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct Input {
    pub positions: Vec<[f64; 2]>,
    #[serde(default)]
    pub constraint_edges: Vec<usize>,
    #[serde(default)]
    pub constraint_edge_types: Option<Vec<EdgeKind>>,
    #[serde(default)]
    pub hole_seeds: Vec<[f64; 2]>,
}

#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Unconstrained,
    Constrained,
    ConstrainedAndHoleBoundary,
}

impl From<EdgeKind> for ConstraintKind {
    fn from(k: EdgeKind) -> Self {
        match k {
            EdgeKind::Unconstrained => ConstraintKind::Unconstrained,
            EdgeKind::Constrained => ConstraintKind::Constrained,
            EdgeKind::ConstrainedAndHoleBoundary => ConstraintKind::ConstrainedAndHoleBoundary,
        }
    }
}

impl From<ConstraintKind> for EdgeKind {
    fn from(k: ConstraintKind) -> Self {
        match k {
            ConstraintKind::Unconstrained => EdgeKind::Unconstrained,
            ConstraintKind::Constrained => EdgeKind::Constrained,
            ConstraintKind::ConstrainedAndHoleBoundary => EdgeKind::ConstrainedAndHoleBoundary,
        }
    }
}

#[derive(Serialize)]
pub struct Output {
    pub positions: Vec<[f64; 2]>,
    pub triangles: Vec<usize>,
    pub halfedges: Vec<isize>,
    pub constrained: Vec<EdgeKind>,
    pub status: String,
}

/// Run the pipeline over a parsed [`Input`] and [`Settings`], producing
/// the JSON-serializable [`Output`]. `f64`-kernel only: the CLI adapter
/// is not where coordinate-type polymorphism is exposed.
pub fn run(input: Input, settings: &Settings) -> Output {
    let positions: Vec<_> = input.positions.iter().map(|&[x, y]| F64Kernel::from_xy(x, y)).collect();
    let holes: Vec<_> = input.hole_seeds.iter().map(|&[x, y]| F64Kernel::from_xy(x, y)).collect();
    let kinds: Option<Vec<ConstraintKind>> = input.constraint_edge_types.map(|ks| ks.into_iter().map(ConstraintKind::from).collect());

    let result = triangulate::<F64Kernel>(&positions, &input.constraint_edges, kinds.as_deref(), &holes, settings);

    Output {
        positions: result.mesh.positions().iter().map(|&p| [F64Kernel::x(p), F64Kernel::y(p)]).collect(),
        triangles: result.mesh.triangles().to_vec(),
        halfedges: result.mesh.halfedges().to_vec(),
        constrained: result.mesh.constrained().iter().map(|&k| EdgeKind::from(k)).collect(),
        status: result.status.to_string(),
    }
}
