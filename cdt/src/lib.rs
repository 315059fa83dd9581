//! 2D constrained Delaunay triangulation with optional Ruppert
//! refinement. The seven pipeline stages run in order, each gated by
//! [`Settings`] and able to short-circuit the rest by recording a
//! non-`Ok` [`Status`]:
//!
//! 1. preprocess (optional COM/PCA reframing)
//! 2. validate input (optional, on by default)
//! 3. build the unconstrained Delaunay triangulation
//! 4. insert constraint edges (Sloan)
//! 5. plant/remove regions (hole seeds, `restoreBoundary`, `auto`)
//! 6. Ruppert refinement (optional)
//! 7. postprocess (inverse of stage 1)

mod builder;
mod constrain;
mod delaunay;
mod geom;
mod hull;
mod kernel;
mod mesh;
mod plant;
mod preprocess;
mod refine;
mod settings;
mod status;
mod validate;

#[cfg(test)]
mod proptests;

pub use builder::TriangulationBuilder;
pub use kernel::{F32Kernel, F64Kernel, I64Kernel, Kernel, PointLocation};
pub use mesh::Mesh;
pub use settings::{ConstraintKind, Preprocessor, RefinementThresholds, Settings, SettingsBuilder};
pub use status::Status;

/// Everything [`triangulate`] produces: the final mesh and the status
/// of the run.
#[derive(Debug, Clone)]
pub struct Output<K: Kernel> {
    pub mesh: Mesh<K>,
    pub status: Status,
}

/// Run the full pipeline over `positions`.
///
/// `constraint_edges` is a flat `(u0, v0, u1, v1, ...)` list of vertex
/// index pairs; `constraint_edge_types` optionally overrides the
/// default [`ConstraintKind::Constrained`] per edge (e.g. to mark hole
/// boundaries as `ConstrainedAndHoleBoundary`). `hole_seeds` are points
/// inside regions stage 5 should remove.
pub fn triangulate<K: Kernel>(
    positions: &[K::Point],
    constraint_edges: &[usize],
    constraint_edge_types: Option<&[ConstraintKind]>,
    hole_seeds: &[K::Point],
    settings: &Settings,
) -> Output<K> {
    let mut status = Status::Ok;

    if let Err(e) = settings.validate() {
        return Output {
            mesh: Mesh::new(Vec::new()),
            status: e,
        };
    }

    let mut working_positions = positions.to_vec();
    let mut working_holes = hole_seeds.to_vec();
    let transform = preprocess::preprocess::<K>(&mut working_positions, settings.preprocessor);
    preprocess::apply_forward::<K>(&mut working_holes, transform);

    if settings.validate_input {
        if validate::validate::<K>(&working_positions, constraint_edges, constraint_edge_types, &working_holes, settings, &mut status).is_none() {
            return Output {
                mesh: Mesh::new(Vec::new()),
                status,
            };
        }
    }

    log::debug!("building Delaunay triangulation of {} points", positions.len());
    let mut mesh = Mesh::<K>::new(working_positions);
    delaunay::build(&mut mesh, &mut status);

    if status.is_ok() && !constraint_edges.is_empty() {
        log::debug!("inserting {} constraint edges", constraint_edges.len() / 2);
        let kinds = resolve_constraint_kinds(constraint_edges.len() / 2, constraint_edge_types);
        constrain::constrain(&mut mesh, constraint_edges, &kinds, settings.sloan_max_iters, &mut status);
    }

    if status.is_ok() {
        if !working_holes.is_empty() || settings.restore_boundary || settings.auto_holes_and_boundary {
            log::debug!("planting: {} hole seeds, restore_boundary={}, auto={}", working_holes.len(), settings.restore_boundary, settings.auto_holes_and_boundary);
        }
        plant::plant(&mut mesh, &working_holes, settings, &mut status);
    }

    if status.is_ok() && settings.refine_mesh {
        log::debug!("refining mesh to min angle {:.2} rad, max area {:.4}", settings.refinement.angle, settings.refinement.area);
        refine::refine(&mut mesh, settings, &mut status);
    }

    if status.is_err() {
        log::warn!("triangulation finished with status: {}", status);
    }

    let mut positions_out = mesh.positions.clone();
    preprocess::postprocess::<K>(&mut positions_out, transform);
    mesh.positions = positions_out;

    Output { mesh, status }
}

fn resolve_constraint_kinds(n: usize, types: Option<&[ConstraintKind]>) -> Vec<ConstraintKind> {
    match types {
        Some(t) => t.to_vec(),
        None => vec![ConstraintKind::Constrained; n],
    }
}
