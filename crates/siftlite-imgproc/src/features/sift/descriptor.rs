use super::{gradient, Keypoint};
use crate::error::SiftError;
use crate::parallel::{map_ordered, ExecutionStrategy};
use crate::pyramid::ScaleSpace;

/// Number of spatial cells along each side of the descriptor window.
pub const DESCRIPTOR_CELLS: usize = 4;

/// Number of orientation bins per spatial cell, 45 degrees each.
pub const DESCRIPTOR_BINS: usize = 8;

/// Length of a descriptor vector.
pub const DESCRIPTOR_SIZE: usize = DESCRIPTOR_CELLS * DESCRIPTOR_CELLS * DESCRIPTOR_BINS;

/// Maximum value of a descriptor component after the first normalization.
pub const DESCRIPTOR_CLIP: f32 = 0.2;

/// A 128-d gradient histogram, laid out as cell row, cell column, orientation bin.
pub type Descriptor = [f32; DESCRIPTOR_SIZE];

/// Normalize, clip at [`DESCRIPTOR_CLIP`] and renormalize a raw histogram.
///
/// Histograms with a norm below `1e-6` are left untouched.
fn normalize_descriptor(desc: &mut Descriptor) {
    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= 1e-6 {
        return;
    }

    desc.iter_mut()
        .for_each(|v| *v = (*v / norm).clamp(0.0, DESCRIPTOR_CLIP));

    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    desc.iter_mut().for_each(|v| *v /= norm + 1e-6);
}

/// Compute the descriptor of an oriented keypoint.
///
/// The window of side `round(8·sigma)` is centered on the keypoint in its
/// blur level and rotated by the keypoint orientation. Each sample offset
/// `(dx, dy)` is rotated once; the rotated offset both selects the image
/// pixel (rounded) and the 4x4 spatial cell, so cell boundaries follow the
/// rotated window exactly. Gradient angles are taken relative to the
/// keypoint orientation and binned by `round(angle / 45) mod 8`; magnitudes
/// are weighted by a gaussian of standard deviation half the window side.
///
/// Degenerate windows (no gradient, or out of the image) produce the zero vector.
/// A keypoint without orientation is described at angle zero.
pub fn compute_descriptor(keypoint: &Keypoint, space: &ScaleSpace) -> Descriptor {
    let mut desc = [0.0f32; DESCRIPTOR_SIZE];

    let Some(img) = space
        .octaves()
        .get(keypoint.octave)
        .and_then(|octave| octave.blurs().get(keypoint.layer))
    else {
        return desc;
    };

    let orientation = keypoint.orientation.unwrap_or(0.0);
    let (sin_o, cos_o) = orientation.sin_cos();
    let orientation_deg = orientation.to_degrees();

    let window_size = (8.0 * keypoint.sigma).round() as i64;
    let half_width = window_size / 2;
    let cell_width = half_width as f32 / 2.0 + 1e-5;
    let weight_denom = 2.0 * (0.5 * window_size as f32).powi(2);

    let (base_x, base_y) = keypoint.octave_position();
    let (cols, rows) = (img.cols() as i64, img.rows() as i64);

    for dy in -half_width..half_width {
        for dx in -half_width..half_width {
            let (fdx, fdy) = (dx as f32, dy as f32);
            let rx = cos_o * fdx - sin_o * fdy;
            let ry = sin_o * fdx + cos_o * fdy;

            let ix = (base_x + rx).round() as i64;
            let iy = (base_y + ry).round() as i64;
            if iy <= 0 || iy >= rows - 1 || ix <= 0 || ix >= cols - 1 {
                continue;
            }

            let cell_x = ((rx + half_width as f32) / cell_width).floor();
            let cell_y = ((ry + half_width as f32) / cell_width).floor();
            if cell_x < 0.0
                || cell_y < 0.0
                || cell_x >= DESCRIPTOR_CELLS as f32
                || cell_y >= DESCRIPTOR_CELLS as f32
            {
                continue;
            }

            let (magnitude, angle) = gradient(img, ix as usize, iy as usize);
            let theta = (angle - orientation_deg).rem_euclid(360.0);
            let weight = (-(fdx * fdx + fdy * fdy) / weight_denom).exp();
            let bin = (theta / 45.0).round() as usize % DESCRIPTOR_BINS;

            let cell = cell_y as usize * DESCRIPTOR_CELLS + cell_x as usize;
            desc[cell * DESCRIPTOR_BINS + bin] += magnitude * weight;
        }
    }

    normalize_descriptor(&mut desc);
    desc
}

/// Compute the descriptors of a set of keypoints, in keypoint order.
pub fn compute_descriptors(
    keypoints: &[Keypoint],
    space: &ScaleSpace,
    strategy: ExecutionStrategy,
) -> Result<Vec<Descriptor>, SiftError> {
    let descriptors = map_ordered(keypoints, strategy, |kp| compute_descriptor(kp, space))?;
    Ok(descriptors)
}
