//! Affine transform solver

use crate::geometry::transform::SINGULAR_DETERMINANT;
use crate::geometry::{AffineTransform, Point2};

/// Two points closer than this (mm) are treated as the same point
pub const COINCIDENT_MM: f64 = 1e-9;

/// Why no transform could be fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SolveError {
    /// Expected and measured lists differ in length
    MismatchedLengths,
    /// Fewer than two correspondences
    TooFewPoints,
    /// Coincident or collinear points, or a singular result
    Degenerate,
}

impl core::fmt::Display for SolveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SolveError::MismatchedLengths => {
                write!(f, "expected and measured point counts differ")
            }
            SolveError::TooFewPoints => write!(f, "at least two fiducials are required"),
            SolveError::Degenerate => {
                write!(f, "fiducials are coincident or collinear; no unique transform")
            }
        }
    }
}

/// Fit a design-to-machine transform
///
/// `expected[i]` maps to `measured[i]`. Both are in millimetres.
pub fn solve(expected: &[Point2], measured: &[Point2]) -> Result<AffineTransform, SolveError> {
    if expected.len() != measured.len() {
        return Err(SolveError::MismatchedLengths);
    }

    let transform = match expected.len() {
        0 | 1 => return Err(SolveError::TooFewPoints),
        2 => similarity(expected[0], expected[1], measured[0], measured[1])?,
        _ => least_squares(expected, measured)?,
    };

    let det = transform.determinant();
    if !transform.is_finite() || libm::fabs(det) < SINGULAR_DETERMINANT {
        return Err(SolveError::Degenerate);
    }
    Ok(transform)
}

/// Closed-form similarity from two correspondences
///
/// Treats the measured vector as the expected vector multiplied by a complex
/// number `re + i*im`; that number's magnitude is the scale and its argument
/// the rotation.
fn similarity(
    e0: Point2,
    e1: Point2,
    m0: Point2,
    m1: Point2,
) -> Result<AffineTransform, SolveError> {
    let (ex, ey) = (e1.x - e0.x, e1.y - e0.y);
    let (mx, my) = (m1.x - m0.x, m1.y - m0.y);

    if libm::hypot(ex, ey) < COINCIDENT_MM || libm::hypot(mx, my) < COINCIDENT_MM {
        return Err(SolveError::Degenerate);
    }

    let norm = ex * ex + ey * ey;
    let re = (mx * ex + my * ey) / norm;
    let im = (my * ex - mx * ey) / norm;

    Ok(AffineTransform::new(
        re,
        -im,
        im,
        re,
        m0.x - (re * e0.x - im * e0.y),
        m0.y - (im * e0.x + re * e0.y),
    ))
}

/// Least-squares affine over three or more correspondences
///
/// Coordinates are centred on their centroids so the translation drops out
/// and the two rows of the linear part share one 2x2 normal matrix.
fn least_squares(
    expected: &[Point2],
    measured: &[Point2],
) -> Result<AffineTransform, SolveError> {
    let ce = centroid(expected);
    let cm = centroid(measured);

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    let (mut sx_mx, mut sy_mx, mut sx_my, mut sy_my) = (0.0, 0.0, 0.0, 0.0);

    for (e, m) in expected.iter().zip(measured) {
        let (u, v) = (e.x - ce.x, e.y - ce.y);
        let (p, q) = (m.x - cm.x, m.y - cm.y);
        sxx += u * u;
        sxy += u * v;
        syy += v * v;
        sx_mx += u * p;
        sy_mx += v * p;
        sx_my += u * q;
        sy_my += v * q;
    }

    let spread = sxx + syy;
    let det = sxx * syy - sxy * sxy;
    if spread <= 0.0 || det <= SINGULAR_DETERMINANT * spread * spread {
        return Err(SolveError::Degenerate);
    }

    let a = (syy * sx_mx - sxy * sy_mx) / det;
    let b = (sxx * sy_mx - sxy * sx_mx) / det;
    let c = (syy * sx_my - sxy * sy_my) / det;
    let d = (sxx * sy_my - sxy * sx_my) / det;

    Ok(AffineTransform::new(
        a,
        b,
        c,
        d,
        cm.x - (a * ce.x + b * ce.y),
        cm.y - (c * ce.x + d * ce.y),
    ))
}

fn centroid(points: &[Point2]) -> Point2 {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / n, sy / n)
}

/// Root-mean-square distance (mm) between `transform(expected)` and `measured`
pub fn rms_residual(
    transform: &AffineTransform,
    expected: &[Point2],
    measured: &[Point2],
) -> f64 {
    let n = expected.len().min(measured.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = expected
        .iter()
        .zip(measured)
        .map(|(e, m)| {
            let p = transform.apply(*e);
            let (dx, dy) = (p.x - m.x, p.y - m.y);
            dx * dx + dy * dy
        })
        .sum();
    libm::sqrt(sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn map(t: &AffineTransform, points: &[Point2]) -> std::vec::Vec<Point2> {
        points.iter().map(|p| t.apply(*p)).collect()
    }

    fn assert_transform_eq(actual: &AffineTransform, expected: &AffineTransform, eps: f64) {
        assert_relative_eq!(actual.a, expected.a, epsilon = eps);
        assert_relative_eq!(actual.b, expected.b, epsilon = eps);
        assert_relative_eq!(actual.c, expected.c, epsilon = eps);
        assert_relative_eq!(actual.d, expected.d, epsilon = eps);
        assert_relative_eq!(actual.tx, expected.tx, epsilon = eps);
        assert_relative_eq!(actual.ty, expected.ty, epsilon = eps);
    }

    #[test]
    fn test_mismatched_lengths() {
        let e = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        let m = [Point2::new(0.0, 0.0)];
        assert_eq!(solve(&e, &m), Err(SolveError::MismatchedLengths));
    }

    #[test]
    fn test_too_few_points() {
        assert_eq!(solve(&[], &[]), Err(SolveError::TooFewPoints));
        let p = [Point2::new(3.0, 4.0)];
        assert_eq!(solve(&p, &p), Err(SolveError::TooFewPoints));
    }

    #[test]
    fn test_two_points_pure_translation() {
        let e = [Point2::new(0.0, 0.0), Point2::new(50.0, 0.0)];
        let m = [Point2::new(10.0, 10.0), Point2::new(60.0, 10.0)];
        let t = solve(&e, &m).unwrap();
        assert_transform_eq(&t, &AffineTransform::translation(10.0, 10.0), 1e-12);
    }

    #[test]
    fn test_two_points_coincident() {
        let e = [Point2::new(5.0, 5.0), Point2::new(5.0, 5.0)];
        let m = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert_eq!(solve(&e, &m), Err(SolveError::Degenerate));

        let e = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        let m = [Point2::new(7.0, 7.0), Point2::new(7.0, 7.0)];
        assert_eq!(solve(&e, &m), Err(SolveError::Degenerate));
    }

    #[test]
    fn test_collinear_three_points() {
        let e = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
        ];
        let m = [
            Point2::new(1.0, 1.0),
            Point2::new(11.0, 11.0),
            Point2::new(21.0, 21.0),
        ];
        assert_eq!(solve(&e, &m), Err(SolveError::Degenerate));
    }

    #[test]
    fn test_three_points_with_shear() {
        let truth = AffineTransform::new(1.01, 0.02, -0.015, 0.99, 120.0, -40.0);
        let e = [
            Point2::new(5.0, 5.0),
            Point2::new(95.0, 5.0),
            Point2::new(5.0, 75.0),
        ];
        let t = solve(&e, &map(&truth, &e)).unwrap();
        assert_transform_eq(&t, &truth, 1e-9);
        assert_relative_eq!(rms_residual(&t, &e, &map(&truth, &e)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rms_residual_reports_noise() {
        let e = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
        ];
        let mut m = e;
        m[3].x += 0.4;
        let t = solve(&e, &m).unwrap();
        assert!(rms_residual(&t, &e, &m) > 0.0);
    }

    proptest! {
        #[test]
        fn prop_recovers_affine(
            a in 0.8f64..1.2,
            b in -0.2f64..0.2,
            c in -0.2f64..0.2,
            d in 0.8f64..1.2,
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
            extra_x in -50.0f64..150.0,
            extra_y in -50.0f64..150.0,
        ) {
            let truth = AffineTransform::new(a, b, c, d, tx, ty);
            let e = [
                Point2::new(0.0, 0.0),
                Point2::new(100.0, 0.0),
                Point2::new(0.0, 80.0),
                Point2::new(extra_x, extra_y),
            ];
            let t = solve(&e, &map(&truth, &e)).unwrap();
            prop_assert!((t.a - a).abs() < 1e-9);
            prop_assert!((t.b - b).abs() < 1e-9);
            prop_assert!((t.c - c).abs() < 1e-9);
            prop_assert!((t.d - d).abs() < 1e-9);
            prop_assert!((t.tx - tx).abs() < 1e-9);
            prop_assert!((t.ty - ty).abs() < 1e-9);
        }

        #[test]
        fn prop_two_points_recover_similarity(
            scale in 0.5f64..2.0,
            rotation in -179.0f64..179.0,
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
        ) {
            let truth = AffineTransform::similarity(scale, rotation, tx, ty);
            let e = [Point2::new(10.0, 20.0), Point2::new(70.0, -5.0)];
            let t = solve(&e, &map(&truth, &e)).unwrap();
            prop_assert!((t.a - truth.a).abs() < 1e-9);
            prop_assert!((t.b - truth.b).abs() < 1e-9);
            prop_assert!((t.c - truth.c).abs() < 1e-9);
            prop_assert!((t.d - truth.d).abs() < 1e-9);
            prop_assert!((t.tx - truth.tx).abs() < 1e-9);
            prop_assert!((t.ty - truth.ty).abs() < 1e-9);
            prop_assert!((t.rotation_deg() - rotation).abs() < 1e-9);
        }
    }
}
