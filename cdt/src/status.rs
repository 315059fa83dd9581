//! Status accumulator. Replaces an ad hoc `Result<_, ()>` with a sum
//! type that names each failure mode, so a caller can match on *why* a
//! run failed instead of just that it did.

use thiserror::Error;

/// The single status value accumulated across a triangulation run.
/// First error wins within a stage; later stages are skipped once the
/// status is not [`Status::Ok`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Status {
    #[error("ok")]
    Ok,

    #[error("seed triangle is collinear or fewer than 3 points were supplied")]
    DegenerateInput,

    #[error("positions array has fewer than 3 entries ({0})")]
    PositionsLengthLessThan3(usize),

    #[error("position {0} is not finite")]
    PositionsMustBeFinite(usize),

    #[error("position {0} duplicates an earlier position")]
    DuplicatePosition(usize),

    #[error("constraint edge array length ({0}) is not divisible by 2")]
    ConstraintsLengthNotDivisibleBy2(usize),

    #[error("constraint_edge_types length does not match constraint_edges/2")]
    ConstraintArrayLengthMismatch,

    #[error("constraint {0} ({1:?}) has an endpoint out of range (positions has {2})")]
    ConstraintOutOfBounds(usize, (usize, usize), usize),

    #[error("constraint {0} ({1:?}) has two identical endpoints")]
    ConstraintSelfLoop(usize, (usize, usize)),

    #[error("constraints {0} and {1} share the same endpoint set")]
    DuplicateConstraint(usize, usize),

    #[error("constraints {0} and {1} properly intersect")]
    ConstraintIntersection(usize, usize),

    #[error("hole_seeds was provided without constraint_edges")]
    RedundantHolesArray,

    #[error("hole seed {0} is not finite")]
    HoleMustBeFinite(usize),

    #[error("auto_holes_and_boundary requires constraint_edges")]
    ConstraintEdgesMissingForAutoHolesAndBoundary,

    #[error("restore_boundary requires constraint_edges")]
    ConstraintEdgesMissingForRestoreBoundary,

    #[error("refinement was requested but this coordinate type does not support it")]
    RefinementNotSupportedForCoordinateType,

    #[error("sloan_max_iters must be positive ({0})")]
    SloanMaxItersMustBePositive(u64),

    #[error("refinement.area must be positive")]
    RefinementThresholdAreaMustBePositive,

    #[error("refinement.angle must lie in [0, pi/4]")]
    RefinementThresholdAngleOutOfRange,

    #[error("Sloan's flip-resolution loop did not converge within sloan_max_iters")]
    SloanMaxItersExceeded,

    #[error("this kernel's arithmetic capability has no alpha(); integer coordinates do not support refinement")]
    IntegersDoNotSupportMeshRefinement,
}

impl Default for Status {
    fn default() -> Self {
        Status::Ok
    }
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Convenience conversion for callers that would rather work with
    /// `Result` than inspect the `status` field of [`crate::Output`]
    /// directly. Does not change the accumulator semantics: the pipeline
    /// always finishes and returns a full `Output`.
    pub fn into_result(self) -> Result<(), Status> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// First-error-wins accumulation: replaces `self` with `new` only if
    /// `self` was still `Ok`.
    pub(crate) fn record(&mut self, new: Status) {
        if self.is_ok() {
            *self = new;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut s = Status::Ok;
        s.record(Status::DegenerateInput);
        s.record(Status::SloanMaxItersExceeded);
        assert_eq!(s, Status::DegenerateInput);
    }

    #[test]
    fn ok_is_default() {
        assert_eq!(Status::default(), Status::Ok);
    }
}
