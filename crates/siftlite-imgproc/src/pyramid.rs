use siftlite_image::{Image, ImageError, ImageSize};

use crate::error::{ensure_positive, SiftError};
use crate::filter::gaussian_blur;
use crate::parallel::ExecutionStrategy;

/// Lower bound for the squared incremental sigma between two blur levels.
const MIN_SIGMA_SQ_DIFF: f32 = 1e-6;

/// Parameters of the gaussian scale space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleSpaceParams {
    /// Maximum number of octaves to build.
    pub num_octaves: usize,
    /// Number of scale steps per octave (`S`).
    pub num_scales: usize,
    /// Base smoothing applied to the input image (`σ₀`).
    pub sigma: f32,
    /// A decimated octave is kept only while both of its dimensions exceed this.
    pub min_size: usize,
}

impl Default for ScaleSpaceParams {
    fn default() -> Self {
        Self {
            num_octaves: 4,
            num_scales: 3,
            sigma: 1.6,
            min_size: 16,
        }
    }
}

impl ScaleSpaceParams {
    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), SiftError> {
        ensure_positive("num_octaves", self.num_octaves as f64)?;
        ensure_positive("num_scales", self.num_scales as f64)?;
        ensure_positive("sigma", self.sigma as f64)?;
        ensure_positive("min_size", self.min_size as f64)?;
        Ok(())
    }

    /// Multiplicative sigma step between consecutive levels, `2^(1/S)`.
    pub fn scale_step(&self) -> f32 {
        (1.0 / self.num_scales as f32).exp2()
    }
}

/// One resolution level of the scale space.
#[derive(Clone, Debug)]
pub struct Octave {
    blurs: Vec<Image<f32, 1>>,
    dogs: Vec<Image<f32, 1>>,
}

impl Octave {
    /// Progressively blurred images, `S + 3` of them.
    pub fn blurs(&self) -> &[Image<f32, 1>] {
        &self.blurs
    }

    /// Differences of consecutive blur levels, one fewer than [`Octave::blurs`].
    pub fn dogs(&self) -> &[Image<f32, 1>] {
        &self.dogs
    }

    /// Size of every image in this octave.
    pub fn size(&self) -> ImageSize {
        self.blurs[0].size()
    }
}

/// Gaussian and difference-of-gaussians pyramid of a single image.
#[derive(Clone, Debug)]
pub struct ScaleSpace {
    octaves: Vec<Octave>,
    params: ScaleSpaceParams,
}

impl ScaleSpace {
    /// Build the scale space of a grayscale image.
    ///
    /// Octave 0 starts from `src` blurred with `σ₀`. Each octave holds `S + 3`
    /// levels whose cumulative sigma is `σ₀·k^j`, and seeds the next octave
    /// with a nearest-neighbour decimation of its third-from-last level.
    /// Construction ends after `num_octaves` octaves or as soon as a
    /// decimated level is no larger than `min_size` in either dimension; that
    /// level is discarded.
    ///
    /// # Arguments
    ///
    /// * `src` - The input image with intensities in `[0, 1]`.
    /// * `params` - The scale space parameters.
    /// * `strategy` - Execution strategy for the blur passes.
    ///
    /// # Example
    ///
    /// ```
    /// use siftlite_image::Image;
    /// use siftlite_imgproc::parallel::ExecutionStrategy;
    /// use siftlite_imgproc::pyramid::{ScaleSpace, ScaleSpaceParams};
    ///
    /// let image = Image::<f32, 1>::from_size_val([64, 64].into(), 0.5).unwrap();
    /// let space = ScaleSpace::build(&image, &ScaleSpaceParams::default(), ExecutionStrategy::Serial).unwrap();
    ///
    /// // 64 -> 32 -> 16, the 16 px level is not kept
    /// assert_eq!(space.octaves().len(), 2);
    /// assert_eq!(space.octaves()[0].blurs().len(), 6);
    /// assert_eq!(space.octaves()[0].dogs().len(), 5);
    /// ```
    pub fn build(
        src: &Image<f32, 1>,
        params: &ScaleSpaceParams,
        strategy: ExecutionStrategy,
    ) -> Result<Self, SiftError> {
        params.validate()?;

        let k = params.scale_step();
        let num_levels = params.num_scales + 3;

        let mut base = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        gaussian_blur(src, &mut base, params.sigma, strategy)?;

        let mut octaves = Vec::with_capacity(params.num_octaves);

        for _ in 0..params.num_octaves {
            let mut blurs = Vec::with_capacity(num_levels);
            blurs.push(base);

            let mut sigma_prev = params.sigma;
            for j in 1..num_levels {
                let sigma_total = params.sigma * k.powi(j as i32);
                let sigma_diff = (sigma_total * sigma_total - sigma_prev * sigma_prev)
                    .max(MIN_SIGMA_SQ_DIFF)
                    .sqrt();

                let prev = &blurs[j - 1];
                let mut blurred = Image::<f32, 1>::from_size_val(prev.size(), 0.0)?;
                gaussian_blur(prev, &mut blurred, sigma_diff, strategy)?;
                blurs.push(blurred);

                sigma_prev = sigma_total;
            }

            let dogs = blurs
                .windows(2)
                .map(|pair| pair[1].sub(&pair[0]))
                .collect::<Result<Vec<_>, ImageError>>()?;

            let next_base = if octaves.len() + 1 < params.num_octaves {
                let next = pyrdown_nearest(&blurs[blurs.len() - 3])?;
                let large_enough =
                    next.width() > params.min_size && next.height() > params.min_size;
                large_enough.then_some(next)
            } else {
                None
            };

            octaves.push(Octave { blurs, dogs });

            match next_base {
                Some(next) => base = next,
                None => break,
            }
        }

        log::debug!(
            "scale space: {} octaves, {} levels per octave, base size {}",
            octaves.len(),
            num_levels,
            src.size()
        );

        Ok(Self {
            octaves,
            params: *params,
        })
    }

    /// The octaves from finest to coarsest.
    pub fn octaves(&self) -> &[Octave] {
        &self.octaves
    }

    /// The parameters the scale space was built with.
    pub fn params(&self) -> &ScaleSpaceParams {
        &self.params
    }
}

/// Halve an image by keeping every other row and column.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
///
/// # Returns
///
/// The decimated image with shape (H / 2, W / 2, C).
pub fn pyrdown_nearest<const C: usize>(src: &Image<f32, C>) -> Result<Image<f32, C>, ImageError> {
    let dst_size = ImageSize {
        width: src.width() / 2,
        height: src.height() / 2,
    };

    let src_data = src.as_slice();
    let src_stride = src.width() * C;

    let mut data = Vec::with_capacity(dst_size.width * dst_size.height * C);
    for y in 0..dst_size.height {
        let row = &src_data[2 * y * src_stride..(2 * y + 1) * src_stride];
        for x in 0..dst_size.width {
            data.extend_from_slice(&row[2 * x * C..(2 * x + 1) * C]);
        }
    }

    Image::new(dst_size, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Result<Image<f32, 1>, ImageError> {
        let data = (0..width * height)
            .map(|i| ((i % width) + (i / width)) as f32 / (width + height) as f32)
            .collect();
        Image::new(ImageSize { width, height }, data)
    }

    #[test]
    fn test_pyrdown_nearest() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new(
            ImageSize {
                width: 4,
                height: 3,
            },
            (0..12).map(|v| v as f32).collect(),
        )?;
        let dst = pyrdown_nearest(&src)?;
        assert_eq!(dst.size(), ImageSize { width: 2, height: 1 });
        assert_eq!(dst.as_slice(), &[0.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_dog_count_is_blur_count_minus_one() -> Result<(), SiftError> {
        let image = ramp(96, 80)?;
        let space = ScaleSpace::build(&image, &ScaleSpaceParams::default(), ExecutionStrategy::Serial)?;
        assert!(!space.octaves().is_empty());
        for octave in space.octaves() {
            assert_eq!(octave.blurs().len(), 6);
            assert_eq!(octave.dogs().len(), octave.blurs().len() - 1);
        }
        Ok(())
    }

    #[test]
    fn test_octave_sizes_strictly_decrease() -> Result<(), SiftError> {
        let image = ramp(200, 120)?;
        let params = ScaleSpaceParams {
            num_octaves: 10,
            ..Default::default()
        };
        let space = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial)?;

        // 120 -> 60 -> 30 -> 15, the 15 px level is dropped
        let sizes = space
            .octaves()
            .iter()
            .map(|o| (o.size().width, o.size().height))
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![(200, 120), (100, 60), (50, 30)]);
        assert!(sizes.iter().all(|&(w, h)| w > 16 && h > 16));

        for pair in space.octaves().windows(2) {
            assert!(pair[1].size().width < pair[0].size().width);
            assert!(pair[1].size().height < pair[0].size().height);
        }
        Ok(())
    }

    #[test]
    fn test_octave_count_capped() -> Result<(), SiftError> {
        let image = ramp(256, 256)?;
        let params = ScaleSpaceParams {
            num_octaves: 2,
            ..Default::default()
        };
        let space = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial)?;
        assert_eq!(space.octaves().len(), 2);
        Ok(())
    }

    #[test]
    fn test_constant_image_has_flat_dogs() -> Result<(), SiftError> {
        let image = Image::<f32, 1>::from_size_val([32, 32].into(), 0.25)?;
        let space = ScaleSpace::build(&image, &ScaleSpaceParams::default(), ExecutionStrategy::Serial)?;
        for octave in space.octaves() {
            for dog in octave.dogs() {
                assert!(dog.as_slice().iter().all(|v| v.abs() < 1e-5));
            }
        }
        Ok(())
    }

    #[test]
    fn test_invalid_params() -> Result<(), SiftError> {
        let image = Image::<f32, 1>::from_size_val([32, 32].into(), 0.0)?;
        let params = ScaleSpaceParams {
            sigma: 0.0,
            ..Default::default()
        };
        let res = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial);
        assert!(matches!(
            res,
            Err(SiftError::InvalidParameter { name: "sigma", .. })
        ));

        let params = ScaleSpaceParams {
            num_scales: 0,
            ..Default::default()
        };
        let res = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial);
        assert!(matches!(
            res,
            Err(SiftError::InvalidParameter {
                name: "num_scales",
                ..
            })
        ));

        let params = ScaleSpaceParams {
            min_size: 0,
            ..Default::default()
        };
        let res = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial);
        assert!(matches!(
            res,
            Err(SiftError::InvalidParameter {
                name: "min_size",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_min_size_one_never_builds_empty_octaves() -> Result<(), SiftError> {
        // a 1 px wide image cannot be decimated into a non-empty octave
        let image = ramp(1, 40)?;
        let params = ScaleSpaceParams {
            min_size: 1,
            ..Default::default()
        };
        let space = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial)?;
        assert_eq!(space.octaves().len(), 1);
        assert!(space
            .octaves()
            .iter()
            .all(|o| o.size().width > 0 && o.size().height > 0));
        Ok(())
    }

    #[test]
    fn test_parallel_matches_serial() -> Result<(), SiftError> {
        let image = ramp(48, 40)?;
        let params = ScaleSpaceParams::default();
        let serial = ScaleSpace::build(&image, &params, ExecutionStrategy::Serial)?;
        let parallel = ScaleSpace::build(&image, &params, ExecutionStrategy::Parallel)?;
        assert_eq!(serial.octaves().len(), parallel.octaves().len());
        for (a, b) in serial.octaves().iter().zip(parallel.octaves()) {
            assert_eq!(a.blurs(), b.blurs());
            assert_eq!(a.dogs(), b.dogs());
        }
        Ok(())
    }
}
