//! Arithmetic capability: every numeric operation the core needs is
//! expressed against this trait so the same pipeline runs over single
//! precision, double precision and integer coordinates. Generalizes a
//! set of free functions (`circumcenter`, `circumradius`, `in_circle`,
//! `pseudo_angle`, `orient2d_fast`) from hardcoded `f64`/`glam::DVec2`
//! into a trait so a second, third, ... coordinate type can be dropped
//! in without touching Delaunay/Constrain/Plant/Refine.
//!
//! `f32`/`f64` kernels reuse `glam` for the vector arithmetic; the
//! integer kernel widens to `i128` for the two correctness-critical
//! predicates (`orient2d`, `in_circle`), and represents everything else
//! (circumcenters used only for sorting/hashing, never for correctness)
//! in `f64`.

use std::fmt::Debug;

/// Where a point sits relative to a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    OnBoundary,
    Outside,
}

/// The arithmetic capability interface.
///
/// Implementations are monomorphized per coordinate type rather than
/// built from a single generic numeric trait: concrete, non-generic
/// geometry code per coordinate type is easier to audit for precision
/// bugs than one generic-numeric body.
pub trait Kernel: Copy + Clone + Debug + Default + PartialEq {
    /// The stored coordinate pair. Concrete per implementation
    /// (`glam::Vec2`, `glam::DVec2`, a plain `(i64, i64)`, ...).
    type Point: Copy + Clone + Debug + PartialEq;

    fn from_xy(x: f64, y: f64) -> Self::Point;
    fn x(p: Self::Point) -> f64;
    fn y(p: Self::Point) -> f64;

    fn is_finite(p: Self::Point) -> bool;

    fn min(a: Self::Point, b: Self::Point) -> Self::Point {
        Self::from_xy(Self::x(a).min(Self::x(b)), Self::y(a).min(Self::y(b)))
    }
    fn max(a: Self::Point, b: Self::Point) -> Self::Point {
        Self::from_xy(Self::x(a).max(Self::x(b)), Self::y(a).max(Self::y(b)))
    }

    fn distance_sq(a: Self::Point, b: Self::Point) -> f64 {
        let dx = Self::x(a) - Self::x(b);
        let dy = Self::y(a) - Self::y(b);
        dx * dx + dy * dy
    }

    fn dot(a: Self::Point, b: Self::Point) -> f64 {
        Self::x(a) * Self::x(b) + Self::y(a) * Self::y(b)
    }

    fn length_sq(a: Self::Point) -> f64 {
        Self::dot(a, a)
    }

    /// `orient2d(p0, p1, p2)`: negative when `p0,p1,p2` turn clockwise,
    /// matching the crate's clockwise winding convention. Must use
    /// widened arithmetic on integer coordinates.
    fn orient2d(a: Self::Point, b: Self::Point, c: Self::Point) -> f64;

    /// Sign of the InCircle test: `true` iff `p` lies inside the
    /// circumcircle of `a, b, c` (clockwise-oriented). Must use widened
    /// arithmetic (>= 128 bits) on integer coordinates.
    fn in_circle(a: Self::Point, b: Self::Point, c: Self::Point, p: Self::Point) -> bool;

    /// Circumcenter of `a, b, c`, or `None` if the determinant is zero
    /// (collinear triple). Used only for point sorting, hull hashing and
    /// Ruppert circumcenter insertion; never for the orientation/InCircle
    /// correctness predicates above.
    fn circum_center(a: Self::Point, b: Self::Point, c: Self::Point) -> Option<(f64, f64)>;

    fn circum_radius_sq(a: Self::Point, b: Self::Point, c: Self::Point) -> f64 {
        match Self::circum_center(a, b, c) {
            None => f64::INFINITY,
            Some((cx, cy)) => {
                let dx = Self::x(a) - cx;
                let dy = Self::y(a) - cy;
                dx * dx + dy * dy
            }
        }
    }

    /// Pseudoangle: monotone, `atan2`-order-preserving proxy in `[0, 1)`,
    /// used only for hull-hash bucket selection.
    fn pseudo_angle(dx: f64, dy: f64) -> f64 {
        let p = dx / (dx.abs() + dy.abs());
        if dy > 0.0 {
            (3.0 - p) / 4.0
        } else {
            (1.0 + p) / 4.0
        }
    }

    fn hash_key(p: Self::Point, center: (f64, f64), hash_size: usize) -> usize {
        let angle = Self::pseudo_angle(Self::x(p) - center.0, Self::y(p) - center.1);
        ((angle * hash_size as f64) as usize) % hash_size
    }

    /// Barycentric/signed-area point-in-triangle test matching the
    /// clockwise winding convention.
    fn point_in_triangle(p: Self::Point, a: Self::Point, b: Self::Point, c: Self::Point) -> PointLocation {
        let d1 = Self::orient2d(p, a, b);
        let d2 = Self::orient2d(p, b, c);
        let d3 = Self::orient2d(p, c, a);

        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

        if has_neg && has_pos {
            PointLocation::Outside
        } else if d1 == 0.0 || d2 == 0.0 || d3 == 0.0 {
            PointLocation::OnBoundary
        } else {
            PointLocation::Inside
        }
    }

    /// Linear interpolation, used by concentric-shell segment splitting.
    fn lerp(a: Self::Point, b: Self::Point, t: f64) -> Self::Point {
        Self::from_xy(Self::x(a) + (Self::x(b) - Self::x(a)) * t, Self::y(a) + (Self::y(b) - Self::y(a)) * t)
    }

    /// Concentric-shell split parameter `alpha(R, d^2)`. Coordinate
    /// types that cannot support this (integers) return `None`, which
    /// refinement surfaces as `Status::IntegersDoNotSupportMeshRefinement`.
    fn alpha(r: f64, d_sq: f64) -> Option<f64> {
        let d = d_sq.sqrt();
        let k = (d / (2.0 * r)).log2().round();
        Some((r / d) * 2f64.powf(k))
    }

    /// Whether this kernel's `alpha` is meaningful. Integer kernels
    /// override this to `false` even though `alpha` above has a default
    /// body, because refinement is unsupported for them regardless of
    /// what the formula would compute
    /// (`Status::RefinementNotSupportedForCoordinateType`).
    fn supports_refinement() -> bool {
        true
    }
}

/// Double-precision kernel, the crate's default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct F64Kernel;

impl Kernel for F64Kernel {
    type Point = glam::DVec2;

    fn from_xy(x: f64, y: f64) -> Self::Point {
        glam::DVec2::new(x, y)
    }
    fn x(p: Self::Point) -> f64 {
        p.x
    }
    fn y(p: Self::Point) -> f64 {
        p.y
    }
    fn is_finite(p: Self::Point) -> bool {
        p.x.is_finite() && p.y.is_finite()
    }

    fn orient2d(a: Self::Point, b: Self::Point, c: Self::Point) -> f64 {
        (a.y - c.y) * (b.x - c.x) - (a.x - c.x) * (b.y - c.y)
    }

    fn in_circle(a: Self::Point, b: Self::Point, c: Self::Point, p: Self::Point) -> bool {
        let d = a - p;
        let e = b - p;
        let f = c - p;

        let ap = d.length_squared();
        let bp = e.length_squared();
        let cp = f.length_squared();

        (d.x * (e.y * cp - bp * f.y) - d.y * (e.x * cp - bp * f.x) + ap * (e.x * f.y - e.y * f.x)) < 0.0
    }

    fn circum_center(a: Self::Point, b: Self::Point, c: Self::Point) -> Option<(f64, f64)> {
        let d = b - a;
        let e = c - a;
        let bl = d.length_squared();
        let cl = e.length_squared();
        let det = d.x * e.y - d.y * e.x;
        if det == 0.0 {
            return None;
        }
        let dia = 0.5 / det;
        let x = a.x + (e.y * bl - d.y * cl) * dia;
        let y = a.y + (d.x * cl - e.x * bl) * dia;
        Some((x, y))
    }
}

/// Single-precision kernel. Geometry is carried in `f32` (matching the
/// reduced precision a caller opted into); the correctness-critical
/// predicates are still evaluated with `f64` intermediates, which is
/// enough headroom above `f32`'s ~7 decimal digits for the inputs this
/// crate expects; adaptive/exact arithmetic is out of scope.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct F32Kernel;

impl Kernel for F32Kernel {
    type Point = glam::Vec2;

    fn from_xy(x: f64, y: f64) -> Self::Point {
        glam::Vec2::new(x as f32, y as f32)
    }
    fn x(p: Self::Point) -> f64 {
        p.x as f64
    }
    fn y(p: Self::Point) -> f64 {
        p.y as f64
    }
    fn is_finite(p: Self::Point) -> bool {
        p.x.is_finite() && p.y.is_finite()
    }

    fn orient2d(a: Self::Point, b: Self::Point, c: Self::Point) -> f64 {
        F64Kernel::orient2d(
            F64Kernel::from_xy(a.x as f64, a.y as f64),
            F64Kernel::from_xy(b.x as f64, b.y as f64),
            F64Kernel::from_xy(c.x as f64, c.y as f64),
        )
    }

    fn in_circle(a: Self::Point, b: Self::Point, c: Self::Point, p: Self::Point) -> bool {
        F64Kernel::in_circle(
            F64Kernel::from_xy(a.x as f64, a.y as f64),
            F64Kernel::from_xy(b.x as f64, b.y as f64),
            F64Kernel::from_xy(c.x as f64, c.y as f64),
            F64Kernel::from_xy(p.x as f64, p.y as f64),
        )
    }

    fn circum_center(a: Self::Point, b: Self::Point, c: Self::Point) -> Option<(f64, f64)> {
        F64Kernel::circum_center(
            F64Kernel::from_xy(a.x as f64, a.y as f64),
            F64Kernel::from_xy(b.x as f64, b.y as f64),
            F64Kernel::from_xy(c.x as f64, c.y as f64),
        )
    }
}

/// Integer kernel (`i64` storage). `orient2d`/`in_circle` widen to
/// `i128` intermediates: partial sums like `a*(b*cp - bp*c)` can exceed
/// 64 bits well before the final determinant does. Refinement is
/// unsupported (`alpha` has no sound definition for lattice points), so
/// `supports_refinement` returns `false` and callers asking for
/// refinement over this kernel get
/// `Status::RefinementNotSupportedForCoordinateType`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct I64Kernel;

impl Kernel for I64Kernel {
    type Point = (i64, i64);

    fn from_xy(x: f64, y: f64) -> Self::Point {
        (x.round() as i64, y.round() as i64)
    }
    fn x(p: Self::Point) -> f64 {
        p.0 as f64
    }
    fn y(p: Self::Point) -> f64 {
        p.1 as f64
    }
    fn is_finite(_p: Self::Point) -> bool {
        true
    }

    fn orient2d(a: Self::Point, b: Self::Point, c: Self::Point) -> f64 {
        let (ax, ay) = (a.0 as i128, a.1 as i128);
        let (bx, by) = (b.0 as i128, b.1 as i128);
        let (cx, cy) = (c.0 as i128, c.1 as i128);
        let v = (ay - cy) * (bx - cx) - (ax - cx) * (by - cy);
        v as f64
    }

    fn in_circle(a: Self::Point, b: Self::Point, c: Self::Point, p: Self::Point) -> bool {
        let widen = |v: Self::Point| (v.0 as i128 - p.0 as i128, v.1 as i128 - p.1 as i128);
        let d = widen(a);
        let e = widen(b);
        let f = widen(c);

        let ap = d.0 * d.0 + d.1 * d.1;
        let bp = e.0 * e.0 + e.1 * e.1;
        let cp = f.0 * f.0 + f.1 * f.1;

        let v = d.0 * (e.1 * cp - bp * f.1) - d.1 * (e.0 * cp - bp * f.0) + ap * (e.0 * f.1 - e.1 * f.0);
        v < 0
    }

    fn circum_center(a: Self::Point, b: Self::Point, c: Self::Point) -> Option<(f64, f64)> {
        F64Kernel::circum_center(
            F64Kernel::from_xy(a.0 as f64, a.1 as f64),
            F64Kernel::from_xy(b.0 as f64, b.1 as f64),
            F64Kernel::from_xy(c.0 as f64, c.1 as f64),
        )
    }

    fn alpha(_r: f64, _d_sq: f64) -> Option<f64> {
        None
    }

    fn supports_refinement() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orient2d_matches_winding_convention() {
        let a = F64Kernel::from_xy(0.0, 0.0);
        let b = F64Kernel::from_xy(1.0, 0.0);
        let c = F64Kernel::from_xy(0.0, 1.0);
        // a, b, c is counter-clockwise in screen coords; clockwise kernel
        // orientation reports it as negative.
        assert!(F64Kernel::orient2d(a, b, c) < 0.0);
    }

    #[test]
    fn in_circle_detects_center_point() {
        let a = F64Kernel::from_xy(1.0, 0.0);
        let b = F64Kernel::from_xy(-1.0, 0.0);
        let c = F64Kernel::from_xy(0.0, 1.0);
        let center = F64Kernel::from_xy(0.0, 0.0);
        assert!(F64Kernel::in_circle(a, b, c, center));
        let far = F64Kernel::from_xy(10.0, 10.0);
        assert!(!F64Kernel::in_circle(a, b, c, far));
    }

    #[test]
    fn integer_kernel_matches_f64_kernel_orientation_sign() {
        let fa = I64Kernel::from_xy(0.0, 0.0);
        let fb = I64Kernel::from_xy(4.0, 0.0);
        let fc = I64Kernel::from_xy(0.0, 4.0);
        assert!(I64Kernel::orient2d(fa, fb, fc) < 0.0);
        assert!(!I64Kernel::supports_refinement());
    }

    #[test]
    fn pseudo_angle_is_monotone_per_quadrant() {
        let a0 = F64Kernel::pseudo_angle(1.0, 0.0001);
        let a1 = F64Kernel::pseudo_angle(0.0001, 1.0);
        let a2 = F64Kernel::pseudo_angle(-1.0, 0.0001);
        let a3 = F64Kernel::pseudo_angle(-0.0001, -1.0);
        assert!(a0 < a1 && a1 < a2 && a2 < a3);
    }
}
