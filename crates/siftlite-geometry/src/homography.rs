use crate::{linalg, HomographyError};

/// Determinants below this magnitude mark a homography as singular.
const MIN_HOMOGRAPHY_DET: f64 = 1e-8;

/// Similarity moving the centroid of `points` to the origin at mean distance `√2`.
fn normalization_transform(points: &[[f64; 2]]) -> Result<[[f64; 3]; 3], HomographyError> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist < 1e-12 {
        return Err(HomographyError::DegenerateSample);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok([[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]])
}

fn inverse_normalization(t: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let s = t[0][0];
    [
        [1.0 / s, 0.0, -t[0][2] / s],
        [0.0, 1.0 / s, -t[1][2] / s],
        [0.0, 0.0, 1.0],
    ]
}

fn apply_transform(t: &[[f64; 3]; 3], p: &[f64; 2]) -> [f64; 2] {
    [
        t[0][0] * p[0] + t[0][2],
        t[1][1] * p[1] + t[1][2],
    ]
}

/// Direct linear transform over any number of correspondences.
fn solve_dlt(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> Result<[[f64; 3]; 3], HomographyError> {
    let t1 = normalization_transform(x1)?;
    let t2 = normalization_transform(x2)?;

    // construct matrix A
    let mut mat_a = faer::Mat::<f64>::zeros(2 * x1.len(), 9);
    for (i, (p1, p2)) in x1.iter().zip(x2.iter()).enumerate() {
        let [x, y] = apply_transform(&t1, p1);
        let [u, v] = apply_transform(&t2, p2);

        mat_a.write(2 * i, 0, x);
        mat_a.write(2 * i, 1, y);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -u * x);
        mat_a.write(2 * i, 7, -u * y);
        mat_a.write(2 * i, 8, -u);

        mat_a.write(2 * i + 1, 3, x);
        mat_a.write(2 * i + 1, 4, y);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -v * x);
        mat_a.write(2 * i + 1, 7, -v * y);
        mat_a.write(2 * i + 1, 8, -v);
    }

    // the null vector is the right singular vector of the smallest singular value
    let svd = mat_a.svd();
    let h = svd.v().col(8);

    let h_norm = [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], h[8]]];

    // undo the point normalization
    let mut homo = linalg::mat33_mul_mat33(
        &linalg::mat33_mul_mat33(&inverse_normalization(&t2), &h_norm),
        &t1,
    );

    if !linalg::normalize_mat33_inplace(&mut homo) {
        return Err(HomographyError::DegenerateSample);
    }

    if !homo.iter().flatten().all(|v| v.is_finite())
        || linalg::det_mat33(&homo).abs() < MIN_HOMOGRAPHY_DET
    {
        return Err(HomographyError::DegenerateSample);
    }

    Ok(homo)
}

/// Compute the homography matrix from four 2d point correspondences.
///
/// The result maps `x1` onto `x2` and is scaled so that `homo[2][2] == 1`.
/// Samples with three collinear points or repeated points yield
/// [`HomographyError::DegenerateSample`].
///
/// * `x1` - The source 2d points with shape (4, 2).
/// * `x2` - The destination 2d points with shape (4, 2).
/// * `homo` - The output homography matrix from src to dst with shape (3, 3).
pub fn homography_4pt2d(
    x1: &[[f64; 2]; 4],
    x2: &[[f64; 2]; 4],
    homo: &mut [[f64; 3]; 3],
) -> Result<(), HomographyError> {
    *homo = solve_dlt(x1, x2)?;
    Ok(())
}

/// Least-squares homography over four or more correspondences.
///
/// # Arguments
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points, aligned with `x1`.
///
/// # Returns
///
/// The homography from `x1` to `x2` with `h[2][2] == 1`.
pub fn homography_dlt(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> Result<[[f64; 3]; 3], HomographyError> {
    if x1.len() != x2.len() {
        return Err(HomographyError::MismatchedLengths(x1.len(), x2.len()));
    }
    if x1.len() < 4 {
        return Err(HomographyError::InsufficientPoints {
            required: 4,
            actual: x1.len(),
        });
    }
    solve_dlt(x1, x2)
}

/// Map a point through a homography.
///
/// Returns `None` when the point lands on the line at infinity.
pub fn project_point(homo: &[[f64; 3]; 3], point: &[f64; 2]) -> Option<[f64; 2]> {
    let mut p = [0.0; 3];
    linalg::mat33_mul_vec3(homo, &[point[0], point[1], 1.0], &mut p);
    if p[2].abs() < 1e-12 {
        return None;
    }
    Some([p[0] / p[2], p[1] / p[2]])
}

/// Euclidean distance between `H·x1` and `x2`, or infinity when `x1` maps to infinity.
pub fn transfer_error(homo: &[[f64; 3]; 3], x1: &[f64; 2], x2: &[f64; 2]) -> f64 {
    match project_point(homo, x1) {
        Some([u, v]) => ((u - x2[0]).powi(2) + (v - x2[1]).powi(2)).sqrt(),
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_mat_eq(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], epsilon: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = epsilon);
            }
        }
    }

    fn warp(h: &[[f64; 3]; 3], pts: &[[f64; 2]]) -> Vec<[f64; 2]> {
        pts.iter()
            .map(|p| project_point(h, p).unwrap_or([f64::NAN; 2]))
            .collect()
    }

    #[test]
    fn test_homography_4pt2d_identity() -> Result<(), HomographyError> {
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let x2 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let expected = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut homo = [[0.0; 3]; 3];
        homography_4pt2d(&x1, &x2, &mut homo)?;
        assert_mat_eq(&homo, &expected, 1e-9);
        Ok(())
    }

    #[test]
    fn test_homography_4pt2d_transform() -> Result<(), HomographyError> {
        let x1 = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        let expected = [[1.2, 0.1, 5.0], [-0.05, 0.9, 3.0], [0.001, 0.002, 1.0]];
        let mut x2 = [[0.0; 2]; 4];
        for (dst, src) in x2.iter_mut().zip(warp(&expected, &x1)) {
            *dst = src;
        }

        let mut homo = [[0.0; 3]; 3];
        homography_4pt2d(&x1, &x2, &mut homo)?;
        assert_mat_eq(&homo, &expected, 1e-9);
        Ok(())
    }

    #[test]
    fn test_homography_4pt2d_degenerate() {
        // two corners collapse onto the same point: only a singular map fits
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let x2 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let mut homo = [[0.0; 3]; 3];
        assert_eq!(
            homography_4pt2d(&x1, &x2, &mut homo),
            Err(HomographyError::DegenerateSample)
        );

        let x1 = [[3.0, 3.0]; 4];
        assert_eq!(
            homography_4pt2d(&x1, &x2, &mut homo),
            Err(HomographyError::DegenerateSample)
        );
    }

    #[test]
    fn test_homography_dlt_overdetermined() -> Result<(), HomographyError> {
        let expected = [[0.9, -0.2, 12.0], [0.15, 1.1, -4.0], [1e-4, -2e-4, 1.0]];
        let x1 = (0..30)
            .map(|i| [(i * 7 % 50) as f64, (i * 13 % 40) as f64])
            .collect::<Vec<_>>();
        let x2 = warp(&expected, &x1);

        let homo = homography_dlt(&x1, &x2)?;
        assert_mat_eq(&homo, &expected, 1e-8);
        Ok(())
    }

    #[test]
    fn test_homography_dlt_input_checks() {
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            homography_dlt(&x1, &x1[..2]),
            Err(HomographyError::MismatchedLengths(3, 2))
        );
        assert_eq!(
            homography_dlt(&x1, &x1),
            Err(HomographyError::InsufficientPoints {
                required: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_transfer_error() {
        let h = [[1.0, 0.0, 5.0], [0.0, 1.0, 3.0], [0.0, 0.0, 1.0]];
        assert_relative_eq!(transfer_error(&h, &[1.0, 1.0], &[6.0, 4.0]), 0.0);
        assert_relative_eq!(transfer_error(&h, &[1.0, 1.0], &[9.0, 8.0]), 5.0);

        // x + y = 0 goes to infinity
        let h = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        assert!(transfer_error(&h, &[1.0, -1.0], &[0.0, 0.0]).is_infinite());
        assert!(project_point(&h, &[1.0, -1.0]).is_none());
    }
}
