use siftlite_image::{Image, ImageError};

use super::{kernels, separable_filter};
use crate::parallel::ExecutionStrategy;

/// Blur an image using a gaussian blur filter with edge-replicated borders.
///
/// The kernel size is derived from `sigma` with [`kernels::gaussian_kernel_size`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The sigma of the gaussian kernel, in pixels.
/// * `strategy` - Execution strategy for the row passes.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    let kernel_size = kernels::gaussian_kernel_size(sigma);
    let kernel = kernels::gaussian_kernel_1d(kernel_size, sigma);
    separable_filter(src, dst, &kernel, &kernel, strategy)?;
    Ok(())
}
