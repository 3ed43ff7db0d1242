use siftlite_geometry::ransac::{ransac_homography, RansacParams};
use siftlite_image::Image;
use siftlite_imgproc::features::{
    match_descriptors_ratio,
    sift::{Descriptor, Keypoint, SiftConfig, SiftDetector},
    Match,
};

use crate::SiftliteError;

/// Default threshold of the ratio test.
pub const DEFAULT_MATCH_RATIO: f32 = 0.75;

/// Detect keypoints in a grayscale image and describe them.
///
/// The returned vectors are aligned: `descriptors[i]` describes `keypoints[i]`.
pub fn build_features(
    image: &Image<f32, 1>,
    config: &SiftConfig,
) -> Result<(Vec<Keypoint>, Vec<Descriptor>), SiftliteError> {
    let detector = SiftDetector::new(*config)?;
    Ok(detector.detect_and_compute(image)?)
}

/// Match two descriptor sets with the ratio test.
pub fn match_features(
    descriptors_a: &[Descriptor],
    descriptors_b: &[Descriptor],
    ratio: f32,
) -> Result<Vec<Match>, SiftliteError> {
    Ok(match_descriptors_ratio(descriptors_a, descriptors_b, ratio)?)
}

/// Base-image coordinates of a set of keypoints.
pub fn keypoints_to_points(keypoints: &[Keypoint]) -> Vec<[f64; 2]> {
    keypoints.iter().map(Keypoint::point).collect()
}

/// Outcome of [`estimate_homography`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HomographyEstimate {
    /// Homography mapping image A onto image B, when one was found.
    pub homography: Option<[[f64; 3]; 3]>,
    /// Ascending positions in the match list of the inlier matches.
    pub inliers: Vec<usize>,
}

fn resolve(
    points: &[[f64; 2]],
    match_idx: usize,
    point_idx: usize,
    side: char,
) -> Result<[f64; 2], SiftliteError> {
    points
        .get(point_idx)
        .copied()
        .ok_or(SiftliteError::MatchIndexOutOfBounds {
            match_idx,
            side,
            point_idx,
            len: points.len(),
        })
}

/// Fit a homography to matched points with RANSAC.
///
/// # Arguments
///
/// * `points_a` - Points of image A, indexed by `Match::idx_a`.
/// * `points_b` - Points of image B, indexed by `Match::idx_b`.
/// * `matches` - The correspondences to fit.
/// * `params` - The RANSAC parameters.
///
/// # Returns
///
/// The homography from A to B and the inlier positions in `matches`. Fewer
/// than 4 matches give no homography and no inliers.
///
/// # Example
///
/// ```
/// use siftlite::{estimate_homography, Match, RansacParams};
///
/// let points_a = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0], [3.0, 7.0]];
/// let points_b = points_a.map(|[x, y]| [x + 5.0, y + 3.0]);
/// let matches = (0..5)
///     .map(|i| Match { idx_a: i, idx_b: i, distance: 0.0 })
///     .collect::<Vec<_>>();
///
/// let estimate = estimate_homography(&points_a, &points_b, &matches, &RansacParams::default()).unwrap();
/// assert_eq!(estimate.inliers, vec![0, 1, 2, 3, 4]);
/// ```
pub fn estimate_homography(
    points_a: &[[f64; 2]],
    points_b: &[[f64; 2]],
    matches: &[Match],
    params: &RansacParams,
) -> Result<HomographyEstimate, SiftliteError> {
    let mut x1 = Vec::with_capacity(matches.len());
    let mut x2 = Vec::with_capacity(matches.len());
    for (i, m) in matches.iter().enumerate() {
        x1.push(resolve(points_a, i, m.idx_a, 'a')?);
        x2.push(resolve(points_b, i, m.idx_b, 'b')?);
    }

    let result = ransac_homography(&x1, &x2, params)?;

    Ok(HomographyEstimate {
        homography: result.model,
        inliers: result.inliers,
    })
}

/// Configuration of [`match_image_pair`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Detector and descriptor settings, shared by both images.
    pub sift: SiftConfig,
    /// Threshold of the ratio test.
    pub match_ratio: f32,
    /// Robust estimation settings.
    pub ransac: RansacParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sift: SiftConfig::default(),
            match_ratio: DEFAULT_MATCH_RATIO,
            ransac: RansacParams::default(),
        }
    }
}

/// Summary of matching two images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PairSummary {
    /// Keypoints found in image A.
    pub keypoints_a: usize,
    /// Keypoints found in image B.
    pub keypoints_b: usize,
    /// Matches passing the ratio test.
    pub matches: usize,
    /// Matches consistent with the homography.
    pub inliers: usize,
    /// Homography mapping image A onto image B.
    pub homography: Option<[[f64; 3]; 3]>,
}

/// Run detection, matching and homography estimation on a pair of images.
pub fn match_image_pair(
    image_a: &Image<f32, 1>,
    image_b: &Image<f32, 1>,
    config: &PipelineConfig,
) -> Result<PairSummary, SiftliteError> {
    let (keypoints_a, descriptors_a) = build_features(image_a, &config.sift)?;
    let (keypoints_b, descriptors_b) = build_features(image_b, &config.sift)?;

    let matches = match_features(&descriptors_a, &descriptors_b, config.match_ratio)?;

    let estimate = estimate_homography(
        &keypoints_to_points(&keypoints_a),
        &keypoints_to_points(&keypoints_b),
        &matches,
        &config.ransac,
    )?;

    log::debug!(
        "pair: {} / {} keypoints, {} matches, {} inliers",
        keypoints_a.len(),
        keypoints_b.len(),
        matches.len(),
        estimate.inliers.len()
    );

    Ok(PairSummary {
        keypoints_a: keypoints_a.len(),
        keypoints_b: keypoints_b.len(),
        matches: matches.len(),
        inliers: estimate.inliers.len(),
        homography: estimate.homography,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use siftlite_geometry::HomographyError;

    fn identity_matches(n: usize) -> Vec<Match> {
        (0..n)
            .map(|i| Match {
                idx_a: i,
                idx_b: i,
                distance: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_keypoints_to_points() {
        let kp = Keypoint {
            x: 12.0,
            y: 6.0,
            octave: 1,
            layer: 2,
            sigma: 3.2,
            orientation: Some(0.5),
        };
        assert_eq!(keypoints_to_points(&[kp]), vec![[12.0, 6.0]]);
        assert!(keypoints_to_points(&[]).is_empty());
    }

    #[test]
    fn test_match_index_out_of_bounds() {
        let points = [[0.0, 0.0]; 4];
        let mut matches = identity_matches(4);
        matches[2].idx_b = 9;

        assert_eq!(
            estimate_homography(&points, &points, &matches, &RansacParams::default()),
            Err(SiftliteError::MatchIndexOutOfBounds {
                match_idx: 2,
                side: 'b',
                point_idx: 9,
                len: 4,
            })
        );
    }

    #[test]
    fn test_invalid_ransac_params() {
        let points = [[0.0, 0.0]; 4];
        let params = RansacParams {
            threshold: -1.0,
            ..Default::default()
        };
        assert_eq!(
            estimate_homography(&points, &points, &identity_matches(4), &params),
            Err(SiftliteError::Homography(HomographyError::InvalidThreshold(
                -1.0
            )))
        );
    }

    #[test]
    fn test_pipeline_config_serde() -> Result<(), serde_json::Error> {
        let config = PipelineConfig::default();
        let json = serde_json::to_string_pretty(&config)?;
        let back: PipelineConfig = serde_json::from_str(&json)?;
        assert_eq!(config, back);
        assert_eq!(back.match_ratio, 0.75);
        assert_eq!(back.ransac.max_iterations, 2000);
        Ok(())
    }
}
