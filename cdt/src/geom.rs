//! Small geometric predicates shared by Validate, Constrain and Refine
//! that aren't part of the per-coordinate-type [`Kernel`] capability
//! (they're expressed purely in terms of `orient2d`/`dot`, so a single
//! generic implementation covers every kernel).

use crate::kernel::Kernel;

/// Two segments `(a,b)` and `(c,d)` cross at a single point that is an
/// endpoint of neither. Used both to report `ConstraintIntersection` and
/// by the tunnel-walk crossing test.
pub(crate) fn segments_properly_cross<K: Kernel>(a: K::Point, b: K::Point, c: K::Point, d: K::Point) -> bool {
    let d1 = K::orient2d(c, d, a);
    let d2 = K::orient2d(c, d, b);
    let d3 = K::orient2d(a, b, c);
    let d4 = K::orient2d(a, b, d);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Whether `p` lies exactly on the closed segment `[a, b]`, the "vertex
/// lying exactly on it" split case for constraint insertion.
pub(crate) fn point_on_segment<K: Kernel>(a: K::Point, b: K::Point, p: K::Point) -> bool {
    const EPS: f64 = 1e-9;
    if K::orient2d(a, b, p).abs() > EPS {
        return false;
    }
    let ap = (K::x(p) - K::x(a), K::y(p) - K::y(a));
    let ab = (K::x(b) - K::x(a), K::y(b) - K::y(a));
    let dot = ap.0 * ab.0 + ap.1 * ab.1;
    let len2 = ab.0 * ab.0 + ab.1 * ab.1;
    dot >= -EPS && dot <= len2 + EPS
}
