use siftlite_image::Image;

use super::{assign_all_orientations, compute_descriptors, detect_extrema, Descriptor, Keypoint};
use crate::error::{ensure_positive, SiftError};
use crate::parallel::ExecutionStrategy;
use crate::pyramid::{ScaleSpace, ScaleSpaceParams};

/// Configuration of the SIFT detector.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SiftConfig {
    /// Scale space layout.
    pub scale_space: ScaleSpaceParams,
    /// Minimum absolute difference-of-gaussians response, divided by the number of scales.
    pub contrast_threshold: f32,
    /// Maximum ratio of principal curvatures before a candidate counts as an edge.
    pub edge_threshold: f32,
    /// How the per-layer and per-keypoint stages are executed.
    pub strategy: ExecutionStrategy,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            scale_space: ScaleSpaceParams::default(),
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            strategy: ExecutionStrategy::Serial,
        }
    }
}

impl SiftConfig {
    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), SiftError> {
        self.scale_space.validate()?;
        ensure_positive("contrast_threshold", self.contrast_threshold as f64)?;
        ensure_positive("edge_threshold", self.edge_threshold as f64)?;
        Ok(())
    }
}

/// Scale-invariant keypoint detector and descriptor extractor.
///
/// # Example
///
/// ```
/// use siftlite_image::Image;
/// use siftlite_imgproc::features::sift::{SiftConfig, SiftDetector};
///
/// let image = Image::<f32, 1>::from_size_val([64, 64].into(), 0.5).unwrap();
/// let detector = SiftDetector::new(SiftConfig::default()).unwrap();
/// let (keypoints, descriptors) = detector.detect_and_compute(&image).unwrap();
///
/// assert!(keypoints.is_empty());
/// assert_eq!(keypoints.len(), descriptors.len());
/// ```
#[derive(Clone, Debug)]
pub struct SiftDetector {
    config: SiftConfig,
}

impl SiftDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: SiftConfig) -> Result<Self, SiftError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The detector configuration.
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Build the scale space of an image.
    pub fn scale_space(&self, image: &Image<f32, 1>) -> Result<ScaleSpace, SiftError> {
        ScaleSpace::build(image, &self.config.scale_space, self.config.strategy)
    }

    /// Detect oriented keypoints in a prebuilt scale space.
    pub fn detect(&self, space: &ScaleSpace) -> Result<Vec<Keypoint>, SiftError> {
        let candidates = detect_extrema(
            space,
            self.config.contrast_threshold,
            self.config.edge_threshold,
            self.config.strategy,
        )?;
        assign_all_orientations(&candidates, space, self.config.strategy)
    }

    /// Detect keypoints and compute their descriptors.
    ///
    /// The two returned vectors have the same length; the descriptor at index
    /// `i` describes the keypoint at index `i`.
    ///
    /// # Arguments
    ///
    /// * `image` - Grayscale image with intensities in `[0, 1]`.
    pub fn detect_and_compute(
        &self,
        image: &Image<f32, 1>,
    ) -> Result<(Vec<Keypoint>, Vec<Descriptor>), SiftError> {
        let space = self.scale_space(image)?;
        let keypoints = self.detect(&space)?;
        let descriptors = compute_descriptors(&keypoints, &space, self.config.strategy)?;

        log::debug!(
            "sift: {} keypoints on a {} image",
            keypoints.len(),
            image.size()
        );

        Ok((keypoints, descriptors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sift::testing::texture_image;

    #[test]
    fn test_default_config() {
        let config = SiftConfig::default();
        assert_eq!(config.scale_space.num_octaves, 4);
        assert_eq!(config.scale_space.num_scales, 3);
        assert_eq!(config.scale_space.sigma, 1.6);
        assert_eq!(config.scale_space.min_size, 16);
        assert_eq!(config.contrast_threshold, 0.04);
        assert_eq!(config.edge_threshold, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = SiftConfig {
            edge_threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            SiftDetector::new(config),
            Err(SiftError::InvalidParameter {
                name: "edge_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_config_serde_roundtrip() -> Result<(), serde_json::Error> {
        let config = SiftConfig {
            contrast_threshold: 0.03,
            strategy: ExecutionStrategy::Fixed(2),
            ..Default::default()
        };
        let json = serde_json::to_string(&config)?;
        let back: SiftConfig = serde_json::from_str(&json)?;
        assert_eq!(config, back);
        Ok(())
    }

    #[test]
    fn test_detect_and_compute_is_deterministic() -> Result<(), SiftError> {
        let image = texture_image(80, 72, 21)?;
        let detector = SiftDetector::new(SiftConfig::default())?;
        let (kps_a, desc_a) = detector.detect_and_compute(&image)?;
        let (kps_b, desc_b) = detector.detect_and_compute(&image)?;

        assert!(!kps_a.is_empty());
        assert_eq!(kps_a, kps_b);
        assert_eq!(desc_a, desc_b);
        assert!(kps_a.iter().all(|kp| kp.orientation.is_some()));

        let parallel = SiftDetector::new(SiftConfig {
            strategy: ExecutionStrategy::Parallel,
            ..Default::default()
        })?;
        let (kps_p, desc_p) = parallel.detect_and_compute(&image)?;
        assert_eq!(kps_a, kps_p);
        assert_eq!(desc_a, desc_p);
        Ok(())
    }
}
