//! Stage 1 (and its stage-7 inverse): reframing input coordinates
//! before triangulation per [`Preprocessor`]. Translation only for
//! `Com`; translation plus a rotation onto the point cloud's principal
//! axes for `Pca`. Kept out of [`Kernel`] since it's pure `f64`
//! bookkeeping independent of the coordinate representation the mesh
//! itself uses.

use crate::kernel::Kernel;
use crate::settings::Preprocessor;

/// The inverse of whatever stage 1 did, applied to outputs in stage 7.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Transform {
    None,
    Translate { tx: f64, ty: f64 },
    TranslateRotate { tx: f64, ty: f64, cos: f64, sin: f64 },
}

pub(crate) fn preprocess<K: Kernel>(positions: &mut [K::Point], preprocessor: Preprocessor) -> Transform {
    match preprocessor {
        Preprocessor::None => Transform::None,
        Preprocessor::Com => {
            let (tx, ty) = centroid::<K>(positions);
            for p in positions.iter_mut() {
                *p = K::from_xy(K::x(*p) - tx, K::y(*p) - ty);
            }
            Transform::Translate { tx, ty }
        }
        Preprocessor::Pca => {
            let (tx, ty) = centroid::<K>(positions);
            let (cos, sin) = principal_axis::<K>(positions, tx, ty);
            for p in positions.iter_mut() {
                let (x, y) = (K::x(*p) - tx, K::y(*p) - ty);
                *p = K::from_xy(cos * x + sin * y, -sin * x + cos * y);
            }
            Transform::TranslateRotate { tx, ty, cos, sin }
        }
    }
}

/// Apply an already-computed transform forward (used to carry hole
/// seeds into the same reframed coordinate space as `positions`,
/// without recomputing centroid/rotation from the seeds themselves).
pub(crate) fn apply_forward<K: Kernel>(points: &mut [K::Point], transform: Transform) {
    match transform {
        Transform::None => {}
        Transform::Translate { tx, ty } => {
            for p in points.iter_mut() {
                *p = K::from_xy(K::x(*p) - tx, K::y(*p) - ty);
            }
        }
        Transform::TranslateRotate { tx, ty, cos, sin } => {
            for p in points.iter_mut() {
                let (x, y) = (K::x(*p) - tx, K::y(*p) - ty);
                *p = K::from_xy(cos * x + sin * y, -sin * x + cos * y);
            }
        }
    }
}

/// Undo `preprocess`'s transform on final output positions, so callers
/// see results back in their original coordinate frame.
pub(crate) fn postprocess<K: Kernel>(positions: &mut [K::Point], transform: Transform) {
    match transform {
        Transform::None => {}
        Transform::Translate { tx, ty } => {
            for p in positions.iter_mut() {
                *p = K::from_xy(K::x(*p) + tx, K::y(*p) + ty);
            }
        }
        Transform::TranslateRotate { tx, ty, cos, sin } => {
            for p in positions.iter_mut() {
                let (x, y) = (K::x(*p), K::y(*p));
                *p = K::from_xy(cos * x - sin * y + tx, sin * x + cos * y + ty);
            }
        }
    }
}

fn centroid<K: Kernel>(positions: &[K::Point]) -> (f64, f64) {
    let n = positions.len().max(1) as f64;
    let (sx, sy) = positions.iter().fold((0.0, 0.0), |(sx, sy), &p| (sx + K::x(p), sy + K::y(p)));
    (sx / n, sy / n)
}

/// Rotation `(cos, sin)` aligning the point cloud's dominant spread
/// direction (the principal eigenvector of the covariance matrix) with
/// the x-axis.
fn principal_axis<K: Kernel>(positions: &[K::Point], tx: f64, ty: f64) -> (f64, f64) {
    let n = positions.len().max(1) as f64;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &p in positions {
        let x = K::x(p) - tx;
        let y = K::y(p) - ty;
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    (theta.cos(), theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::F64Kernel;

    #[test]
    fn com_roundtrips_through_postprocess() {
        let original = vec![
            F64Kernel::from_xy(1.0, 2.0),
            F64Kernel::from_xy(5.0, 2.0),
            F64Kernel::from_xy(3.0, 8.0),
        ];
        let mut positions = original.clone();
        let transform = preprocess::<F64Kernel>(&mut positions, Preprocessor::Com);
        assert!(positions.iter().any(|&p| p != original[0]));
        postprocess::<F64Kernel>(&mut positions, transform);
        for (a, b) in positions.iter().zip(original.iter()) {
            assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn pca_roundtrips_through_postprocess() {
        let original = vec![
            F64Kernel::from_xy(0.0, 0.0),
            F64Kernel::from_xy(10.0, 1.0),
            F64Kernel::from_xy(20.0, -1.0),
            F64Kernel::from_xy(5.0, 5.0),
        ];
        let mut positions = original.clone();
        let transform = preprocess::<F64Kernel>(&mut positions, Preprocessor::Pca);
        postprocess::<F64Kernel>(&mut positions, transform);
        for (a, b) in positions.iter().zip(original.iter()) {
            assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn none_is_a_true_noop() {
        let original = vec![F64Kernel::from_xy(1.0, 1.0)];
        let mut positions = original.clone();
        let transform = preprocess::<F64Kernel>(&mut positions, Preprocessor::None);
        assert_eq!(positions, original);
        postprocess::<F64Kernel>(&mut positions, transform);
        assert_eq!(positions, original);
    }
}
