use siftlite_image::Image;

use super::{gradient, Keypoint};
use crate::error::SiftError;
use crate::parallel::{flat_map_ordered, ExecutionStrategy};
use crate::pyramid::ScaleSpace;

/// Number of bins of the orientation histogram, 10 degrees each.
pub const ORIENTATION_BINS: usize = 36;

/// Fraction of the histogram peak a bin needs to spawn an oriented keypoint.
pub const ORIENTATION_PEAK_RATIO: f32 = 0.8;

/// Gaussian-weighted gradient orientation histogram around a pixel.
///
/// Samples lie in the disc of radius `round(3·sigma)` around `(x, y)`;
/// samples on the 1 pixel image border are skipped.
///
/// # Arguments
///
/// * `img` - The blur level the keypoint belongs to.
/// * `x` - Column in the pixel grid of `img`.
/// * `y` - Row in the pixel grid of `img`.
/// * `sigma` - Scale of the keypoint, used for the radius and the weights.
pub fn orientation_histogram(
    img: &Image<f32, 1>,
    x: i64,
    y: i64,
    sigma: f32,
) -> [f32; ORIENTATION_BINS] {
    let mut hist = [0.0f32; ORIENTATION_BINS];

    let radius = (3.0 * sigma).round() as i64;
    let weight_factor = -0.5 / (sigma * sigma);
    let (cols, rows) = (img.cols() as i64, img.rows() as i64);

    for dy in -radius..=radius {
        let yy = y + dy;
        if yy <= 0 || yy >= rows - 1 {
            continue;
        }
        for dx in -radius..=radius {
            let xx = x + dx;
            if xx <= 0 || xx >= cols - 1 || dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (magnitude, angle) = gradient(img, xx as usize, yy as usize);
            let weight = (weight_factor * (dx * dx + dy * dy) as f32).exp();
            let bin = (angle / 10.0).round() as usize % ORIENTATION_BINS;
            hist[bin] += weight * magnitude;
        }
    }

    hist
}

/// Fan a candidate out into one keypoint per dominant orientation.
///
/// Every histogram bin reaching [`ORIENTATION_PEAK_RATIO`] of the peak spawns
/// a copy of `candidate` oriented at the bin angle, in bin order. A candidate
/// without any gradient signal yields no keypoint.
pub fn assign_orientations(candidate: &Keypoint, space: &ScaleSpace) -> Vec<Keypoint> {
    let Some(img) = space
        .octaves()
        .get(candidate.octave)
        .and_then(|octave| octave.blurs().get(candidate.layer))
    else {
        return Vec::new();
    };

    let (x, y) = candidate.octave_position();
    let hist = orientation_histogram(img, x.round() as i64, y.round() as i64, candidate.sigma);

    let peak = hist.iter().cloned().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return Vec::new();
    }

    hist.iter()
        .enumerate()
        .filter(|(_, &value)| value >= ORIENTATION_PEAK_RATIO * peak)
        .map(|(bin, _)| candidate.with_orientation(((bin * 10) as f32).to_radians()))
        .collect()
}

/// Assign orientations to every candidate, keeping the candidate order.
pub fn assign_all_orientations(
    candidates: &[Keypoint],
    space: &ScaleSpace,
    strategy: ExecutionStrategy,
) -> Result<Vec<Keypoint>, SiftError> {
    let oriented = flat_map_ordered(candidates, strategy, |kp| assign_orientations(kp, space))?;

    log::debug!(
        "orientations: {} candidates -> {} oriented keypoints",
        candidates.len(),
        oriented.len()
    );

    Ok(oriented)
}
