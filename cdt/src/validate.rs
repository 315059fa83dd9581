//! Stage 2: input validation. Pure predicate over inputs: sets `status`
//! and nothing else. Opt-in via `Settings::validate_input`; skipping it
//! means undefined behavior on ill-formed inputs, which is explicitly
//! the caller's responsibility.

use crate::geom::segments_properly_cross;
use crate::kernel::Kernel;
use crate::settings::Settings;
use crate::status::Status;

/// Runs every input-shape check in a fixed order and records the first
/// failure. Returns `Some` iff the input
/// shape is sound enough for later stages to run over (even when some
/// non-fatal checks, like duplicate constraints, still ran and failed).
pub(crate) fn validate<K: Kernel>(
    positions: &[K::Point],
    constraint_edges: &[usize],
    constraint_edge_types: Option<&[crate::settings::ConstraintKind]>,
    hole_seeds: &[K::Point],
    settings: &Settings,
    status: &mut Status,
) -> Option<()> {
    if positions.len() < 3 {
        status.record(Status::PositionsLengthLessThan3(positions.len()));
        return None;
    }

    for (i, &p) in positions.iter().enumerate() {
        if !K::is_finite(p) {
            status.record(Status::PositionsMustBeFinite(i));
            return None;
        }
    }

    for i in 0..positions.len() {
        for j in 0..i {
            if K::distance_sq(positions[i], positions[j]) == 0.0 {
                status.record(Status::DuplicatePosition(i));
                return None;
            }
        }
    }

    if constraint_edges.len() % 2 != 0 {
        status.record(Status::ConstraintsLengthNotDivisibleBy2(constraint_edges.len()));
        return None;
    }
    let num_constraints = constraint_edges.len() / 2;

    if let Some(types) = constraint_edge_types {
        if types.len() != num_constraints {
            status.record(Status::ConstraintArrayLengthMismatch);
            return None;
        }
    }

    let pairs: Vec<(usize, usize)> = (0..num_constraints).map(|i| (constraint_edges[2 * i], constraint_edges[2 * i + 1])).collect();

    for (i, &(u, v)) in pairs.iter().enumerate() {
        if u >= positions.len() || v >= positions.len() {
            status.record(Status::ConstraintOutOfBounds(i, (u, v), positions.len()));
            return None;
        }
        if u == v {
            status.record(Status::ConstraintSelfLoop(i, (u, v)));
            return None;
        }
    }

    for i in 0..pairs.len() {
        let (a0, a1) = ordered(pairs[i]);
        for j in 0..i {
            let (b0, b1) = ordered(pairs[j]);
            if a0 == b0 && a1 == b1 {
                status.record(Status::DuplicateConstraint(j, i));
                return None;
            }
        }
    }

    for i in 0..pairs.len() {
        for j in 0..i {
            if properly_intersects::<K>(positions, pairs[i], pairs[j]) {
                status.record(Status::ConstraintIntersection(j, i));
                return None;
            }
        }
    }

    if !hole_seeds.is_empty() && constraint_edges.is_empty() {
        status.record(Status::RedundantHolesArray);
        return None;
    }

    for (i, &p) in hole_seeds.iter().enumerate() {
        if !K::is_finite(p) {
            status.record(Status::HoleMustBeFinite(i));
            return None;
        }
    }

    if settings.auto_holes_and_boundary && constraint_edges.is_empty() {
        status.record(Status::ConstraintEdgesMissingForAutoHolesAndBoundary);
        return None;
    }
    if settings.restore_boundary && constraint_edges.is_empty() {
        status.record(Status::ConstraintEdgesMissingForRestoreBoundary);
        return None;
    }

    Some(())
}

fn ordered(pair: (usize, usize)) -> (usize, usize) {
    if pair.0 <= pair.1 {
        pair
    } else {
        (pair.1, pair.0)
    }
}

/// Two distinct constraints "properly cross" iff their open segments
/// intersect at a single point that is an endpoint of neither, reported
/// as `ConstraintIntersection`. Shared endpoints are allowed.
fn properly_intersects<K: Kernel>(positions: &[K::Point], a: (usize, usize), b: (usize, usize)) -> bool {
    if a.0 == b.0 || a.0 == b.1 || a.1 == b.0 || a.1 == b.1 {
        return false;
    }
    segments_properly_cross::<K>(positions[a.0], positions[a.1], positions[b.0], positions[b.1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::F64Kernel;

    fn pts(v: &[(f64, f64)]) -> Vec<glam::DVec2> {
        v.iter().map(|&(x, y)| F64Kernel::from_xy(x, y)).collect()
    }

    #[test]
    fn rejects_too_few_points() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut status = Status::Ok;
        let out = validate::<F64Kernel>(&p, &[], None, &[], &Settings::default(), &mut status);
        assert!(out.is_none());
        assert_eq!(status, Status::PositionsLengthLessThan3(2));
    }

    #[test]
    fn rejects_duplicate_position() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        let mut status = Status::Ok;
        validate::<F64Kernel>(&p, &[], None, &[], &Settings::default(), &mut status);
        assert_eq!(status, Status::DuplicatePosition(2));
    }

    #[test]
    fn rejects_crossing_constraints() {
        let p = pts(&[(0.0, 0.0), (1.0, 1.0), (0.0, 1.0), (1.0, 0.0)]);
        let mut status = Status::Ok;
        validate::<F64Kernel>(&p, &[0, 1, 2, 3], None, &[], &Settings::default(), &mut status);
        assert_eq!(status, Status::ConstraintIntersection(0, 1));
    }

    #[test]
    fn allows_shared_endpoint_constraints() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let mut status = Status::Ok;
        let out = validate::<F64Kernel>(&p, &[0, 1, 1, 2], None, &[], &Settings::default(), &mut status);
        assert!(out.is_some());
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn rejects_redundant_holes_without_constraints() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let holes = pts(&[(0.1, 0.1)]);
        let mut status = Status::Ok;
        validate::<F64Kernel>(&p, &[], None, &holes, &Settings::default(), &mut status);
        assert_eq!(status, Status::RedundantHolesArray);
    }
}
