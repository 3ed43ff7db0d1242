//! Synthetic images shared by the unit tests.

use rand::{rngs::StdRng, Rng, SeedableRng};
use siftlite_image::{Image, ImageError, ImageSize};

/// A gaussian blob `(cx, cy, std, amplitude)`.
pub(crate) type Blob = (f32, f32, f32, f32);

/// Render gaussian blobs on a flat background, clamped to `[0, 1]`.
pub(crate) fn blob_image(
    width: usize,
    height: usize,
    background: f32,
    blobs: &[Blob],
) -> Result<Image<f32, 1>, ImageError> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let v = blobs.iter().fold(background, |acc, &(cx, cy, s, a)| {
                let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                acc + a * (-d2 / (2.0 * s * s)).exp()
            });
            data.push(v.clamp(0.0, 1.0));
        }
    }
    Image::new(ImageSize { width, height }, data)
}

/// A deterministic texture made of many overlapping blobs of random size and sign.
pub(crate) fn texture_image(width: usize, height: usize, seed: u64) -> Result<Image<f32, 1>, ImageError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let blobs = (0..(width * height) / 80)
        .map(|_| {
            let cx = rng.random_range(0.0..width as f32);
            let cy = rng.random_range(0.0..height as f32);
            let s = rng.random_range(1.5..4.0);
            let a = rng.random_range(0.1..0.3) * if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            (cx, cy, s, a)
        })
        .collect::<Vec<Blob>>();
    blob_image(width, height, 0.5, &blobs)
}
