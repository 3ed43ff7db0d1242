//! Scale-invariant keypoints and descriptors.
//!
//! The pipeline runs in four stages over a [`ScaleSpace`](crate::pyramid::ScaleSpace):
//!
//! 1. [`detect_extrema`] scans the difference-of-gaussians layers for contrasted,
//!    non-edge local extrema.
//! 2. [`assign_orientations`] fans every candidate out into one keypoint per
//!    dominant gradient direction.
//! 3. [`compute_descriptor`] builds the rotation-normalized 128-d vector of each
//!    oriented keypoint.
//! 4. [`SiftDetector::detect_and_compute`] chains the three stages above.

mod descriptor;
pub use descriptor::*;

mod detector;
pub use detector::*;

mod extrema;
pub use extrema::*;

mod keypoint;
pub use keypoint::*;

mod orientation;
pub use orientation::*;

#[cfg(test)]
pub(crate) mod testing;

use siftlite_image::Image;

/// Read a pixel of a single channel image without bounds checks on the coordinates.
///
/// PRECONDITION: `x < img.cols()` and `y < img.rows()`.
#[inline]
pub(crate) fn pixel(img: &Image<f32, 1>, x: usize, y: usize) -> f32 {
    img.as_slice()[y * img.cols() + x]
}

/// Central-difference gradient at an interior pixel.
///
/// Returns the magnitude and the angle in degrees in `[0, 360)`, with the
/// y axis pointing up.
///
/// PRECONDITION: `1 <= x < cols - 1` and `1 <= y < rows - 1`.
#[inline]
pub(crate) fn gradient(img: &Image<f32, 1>, x: usize, y: usize) -> (f32, f32) {
    let gx = pixel(img, x + 1, y) - pixel(img, x - 1, y);
    let gy = pixel(img, x, y - 1) - pixel(img, x, y + 1);
    let magnitude = (gx * gx + gy * gy).sqrt();
    let angle = gy.atan2(gx).to_degrees().rem_euclid(360.0);
    (magnitude, angle)
}
