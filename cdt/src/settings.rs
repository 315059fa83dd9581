//! Pipeline configuration. A `Settings` value gates which of the seven
//! stages run and with what thresholds; it is validated once at the top
//! of [`crate::triangulate`] and never mutated afterward.

/// How input coordinates are reframed before triangulation and the
/// inverse transform applied to outputs. `None` is a real, supported
/// choice, not a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preprocessor {
    #[default]
    None,
    /// Translate so the centroid of the input sits at the origin.
    Com,
    /// Translate to the centroid, then rotate onto the point cloud's
    /// principal axes.
    Pca,
}

/// Per-edge state carried on halfedges, mirrored on twin pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstraintKind {
    Unconstrained,
    Constrained,
    ConstrainedAndHoleBoundary,
}

impl ConstraintKind {
    /// Overlap semantics: the stronger of the two states wins.
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    pub fn is_constrained(self) -> bool {
        !matches!(self, ConstraintKind::Unconstrained)
    }
}

/// Requested minimum-angle/maximum-area quality bound for Ruppert
/// refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementThresholds {
    /// Maximum triangle area. Must be `> 0`.
    pub area: f64,
    /// Minimum interior angle, in radians. Must lie in `[0, pi/4]`.
    pub angle: f64,
}

impl Default for RefinementThresholds {
    fn default() -> Self {
        RefinementThresholds {
            area: 1.0,
            angle: 5.0_f64.to_radians(),
        }
    }
}

/// Pipeline settings: every knob that gates which stages run and with
/// what thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub preprocessor: Preprocessor,
    pub auto_holes_and_boundary: bool,
    pub refine_mesh: bool,
    pub restore_boundary: bool,
    pub validate_input: bool,
    pub sloan_max_iters: u64,
    pub refinement: RefinementThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            preprocessor: Preprocessor::None,
            auto_holes_and_boundary: false,
            refine_mesh: false,
            restore_boundary: false,
            validate_input: true,
            sloan_max_iters: 1_000_000,
            refinement: RefinementThresholds::default(),
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Misconfiguration checks that don't depend on the input points:
    /// `SloanMaxItersMustBePositive`, `RefinementThresholdAreaMustBePositive`,
    /// `RefinementThresholdAngleOutOfRange`.
    pub(crate) fn validate(&self) -> Result<(), crate::Status> {
        if self.sloan_max_iters == 0 {
            return Err(crate::Status::SloanMaxItersMustBePositive(self.sloan_max_iters));
        }
        if self.refinement.area <= 0.0 {
            return Err(crate::Status::RefinementThresholdAreaMustBePositive);
        }
        if !(0.0..=std::f64::consts::FRAC_PI_4).contains(&self.refinement.angle) {
            return Err(crate::Status::RefinementThresholdAngleOutOfRange);
        }
        Ok(())
    }
}

/// Ergonomic incremental construction of [`Settings`] via a chained
/// builder, in the style of `RefinementParameters::new()
/// .exclude_outer_faces(true).with_max_allowed_area(...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsBuilder {
    settings: SettingsOpt,
}

#[derive(Debug, Clone, Copy, Default)]
struct SettingsOpt {
    preprocessor: Option<Preprocessor>,
    auto_holes_and_boundary: Option<bool>,
    refine_mesh: Option<bool>,
    restore_boundary: Option<bool>,
    validate_input: Option<bool>,
    sloan_max_iters: Option<u64>,
    refinement: Option<RefinementThresholds>,
}

impl SettingsBuilder {
    pub fn preprocessor(mut self, p: Preprocessor) -> Self {
        self.settings.preprocessor = Some(p);
        self
    }
    pub fn auto_holes_and_boundary(mut self, v: bool) -> Self {
        self.settings.auto_holes_and_boundary = Some(v);
        self
    }
    pub fn refine_mesh(mut self, v: bool) -> Self {
        self.settings.refine_mesh = Some(v);
        self
    }
    pub fn restore_boundary(mut self, v: bool) -> Self {
        self.settings.restore_boundary = Some(v);
        self
    }
    pub fn validate_input(mut self, v: bool) -> Self {
        self.settings.validate_input = Some(v);
        self
    }
    pub fn sloan_max_iters(mut self, v: u64) -> Self {
        self.settings.sloan_max_iters = Some(v);
        self
    }
    pub fn refinement(mut self, area: f64, angle: f64) -> Self {
        self.settings.refinement = Some(RefinementThresholds { area, angle });
        self
    }

    pub fn build(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            preprocessor: self.settings.preprocessor.unwrap_or(defaults.preprocessor),
            auto_holes_and_boundary: self.settings.auto_holes_and_boundary.unwrap_or(defaults.auto_holes_and_boundary),
            refine_mesh: self.settings.refine_mesh.unwrap_or(defaults.refine_mesh),
            restore_boundary: self.settings.restore_boundary.unwrap_or(defaults.restore_boundary),
            validate_input: self.settings.validate_input.unwrap_or(defaults.validate_input),
            sloan_max_iters: self.settings.sloan_max_iters.unwrap_or(defaults.sloan_max_iters),
            refinement: self.settings.refinement.unwrap_or(defaults.refinement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_kind_overlap_takes_the_stronger_state() {
        assert_eq!(
            ConstraintKind::Constrained.max(ConstraintKind::ConstrainedAndHoleBoundary),
            ConstraintKind::ConstrainedAndHoleBoundary
        );
        assert_eq!(
            ConstraintKind::Unconstrained.max(ConstraintKind::Constrained),
            ConstraintKind::Constrained
        );
    }

    #[test]
    fn default_settings_have_expected_values() {
        let s = Settings::default();
        assert_eq!(s.sloan_max_iters, 1_000_000);
        assert!((s.refinement.area - 1.0).abs() < 1e-12);
        assert!((s.refinement.angle - 5.0_f64.to_radians()).abs() < 1e-12);
        assert!(s.validate_input);
        assert!(!s.refine_mesh);
    }

    #[test]
    fn builder_overrides_only_named_fields() {
        let s = Settings::builder().refine_mesh(true).sloan_max_iters(10).build();
        assert!(s.refine_mesh);
        assert_eq!(s.sloan_max_iters, 10);
        assert!(s.validate_input); // untouched default
    }
}
