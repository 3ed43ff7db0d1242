use rayon::prelude::*;
use siftlite_image::{Image, ImageError};

use crate::parallel::ExecutionStrategy;

/// A separable 2D filter that applies horizontal and vertical 1D convolutions sequentially.
///
/// Samples that fall outside the image replicate the nearest edge pixel.
struct SeparableFilter {
    kernel_x: Vec<f32>,
    kernel_y: Vec<f32>,
    offsets_x: Vec<isize>,
    offsets_y: Vec<isize>,
}

/// Clamp a shifted coordinate into `[0, len)`.
#[inline]
fn replicate(pos: isize, len: usize) -> usize {
    pos.clamp(0, len as isize - 1) as usize
}

impl SeparableFilter {
    fn new(kernel_x: &[f32], kernel_y: &[f32]) -> Self {
        let half_x = kernel_x.len() / 2;
        let half_y = kernel_y.len() / 2;

        let offsets_x = (0..kernel_x.len())
            .map(|i| i as isize - half_x as isize)
            .collect();

        let offsets_y = (0..kernel_y.len())
            .map(|i| i as isize - half_y as isize)
            .collect();

        Self {
            kernel_x: kernel_x.to_vec(),
            kernel_y: kernel_y.to_vec(),
            offsets_x,
            offsets_y,
        }
    }

    fn horizontal_row<const C: usize>(&self, src_row: &[f32], dst_row: &mut [f32], cols: usize) {
        for c in 0..cols {
            let mut acc = [0.0f32; C];
            for (&k, &off) in self.kernel_x.iter().zip(self.offsets_x.iter()) {
                let idx = replicate(c as isize + off, cols) * C;
                for (ch, acc_val) in acc.iter_mut().enumerate() {
                    *acc_val += src_row[idx + ch] * k;
                }
            }
            dst_row[c * C..(c + 1) * C].copy_from_slice(&acc);
        }
    }

    fn vertical_row<const C: usize>(
        &self,
        temp: &[f32],
        dst_row: &mut [f32],
        r: usize,
        rows: usize,
        cols: usize,
    ) {
        for c in 0..cols {
            let mut acc = [0.0f32; C];
            for (&k, &off) in self.kernel_y.iter().zip(self.offsets_y.iter()) {
                let y = replicate(r as isize + off, rows);
                let idx = (y * cols + c) * C;
                for (ch, acc_val) in acc.iter_mut().enumerate() {
                    *acc_val += temp[idx + ch] * k;
                }
            }
            dst_row[c * C..(c + 1) * C].copy_from_slice(&acc);
        }
    }

    fn apply<const C: usize>(
        &self,
        src: &Image<f32, C>,
        dst: &mut Image<f32, C>,
        strategy: ExecutionStrategy,
    ) {
        let rows = src.rows();
        let cols = src.cols();
        let stride = cols * C;

        let src_data = src.as_slice();
        let mut temp = vec![0.0f32; src_data.len()];

        if strategy.is_parallel() {
            temp.par_chunks_mut(stride)
                .zip(src_data.par_chunks(stride))
                .for_each(|(row_temp, row_src)| self.horizontal_row::<C>(row_src, row_temp, cols));

            dst.as_slice_mut()
                .par_chunks_mut(stride)
                .enumerate()
                .for_each(|(r, row_dst)| self.vertical_row::<C>(&temp, row_dst, r, rows, cols));
        } else {
            temp.chunks_mut(stride)
                .zip(src_data.chunks(stride))
                .for_each(|(row_temp, row_src)| self.horizontal_row::<C>(row_src, row_temp, cols));

            dst.as_slice_mut()
                .chunks_mut(stride)
                .enumerate()
                .for_each(|(r, row_dst)| self.vertical_row::<C>(&temp, row_dst, r, rows, cols));
        }
    }
}

/// Apply a separable filter with edge-replicated borders.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
/// * `strategy` - Execution strategy: `Serial`, `Parallel` or `Fixed`.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelLength(
            kernel_x.len(),
            kernel_y.len(),
        ));
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.cols() == 0 || src.rows() == 0 {
        return Err(ImageError::EmptyImage(src.cols(), src.rows()));
    }

    let filter = SeparableFilter::new(kernel_x, kernel_y);
    filter.apply(src, dst, strategy);

    Ok(())
}
