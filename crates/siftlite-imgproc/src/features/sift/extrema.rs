use siftlite_image::Image;

use super::{pixel, Keypoint};
use crate::error::{ensure_positive, SiftError};
use crate::parallel::{flat_map_ordered, ExecutionStrategy};
use crate::pyramid::ScaleSpace;

/// Second derivatives `[dxx, dyy, dxy]` of an image at an interior pixel.
///
/// PRECONDITION: `1 <= x < cols - 1` and `1 <= y < rows - 1`.
pub fn hessian_2x2(img: &Image<f32, 1>, x: usize, y: usize) -> [f32; 3] {
    let center = pixel(img, x, y);
    let dxx = pixel(img, x + 1, y) + pixel(img, x - 1, y) - 2.0 * center;
    let dyy = pixel(img, x, y + 1) + pixel(img, x, y - 1) - 2.0 * center;
    let dxy = (pixel(img, x + 1, y + 1) + pixel(img, x - 1, y - 1)
        - pixel(img, x - 1, y + 1)
        - pixel(img, x + 1, y - 1))
        / 4.0;
    [dxx, dyy, dxy]
}

/// Whether the principal curvature ratio at a pixel marks it as an edge.
///
/// The pixel is an edge when the hessian determinant is not positive, or when
/// `tr² / det ≥ (r + 1)² / r` with `r = edge_threshold`.
///
/// PRECONDITION: `1 <= x < cols - 1` and `1 <= y < rows - 1`.
pub fn is_edge_response(img: &Image<f32, 1>, x: usize, y: usize, edge_threshold: f32) -> bool {
    let [dxx, dyy, dxy] = hessian_2x2(img, x, y);
    let trace = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    if det <= 0.0 {
        return true;
    }
    trace * trace * edge_threshold >= (edge_threshold + 1.0).powi(2) * det
}

/// Whether `value` at `(x, y)` of the middle layer beats all of its 26 neighbours.
///
/// Positive values must be strict maxima and negative values strict minima.
fn is_strict_extremum(layers: [&Image<f32, 1>; 3], x: usize, y: usize, value: f32) -> bool {
    for (l, img) in layers.iter().enumerate() {
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if l == 1 && nx == x && ny == y {
                    continue;
                }
                let neighbour = pixel(img, nx, ny);
                let beaten = if value > 0.0 {
                    neighbour >= value
                } else {
                    neighbour <= value
                };
                if beaten {
                    return false;
                }
            }
        }
    }
    true
}

fn scan_layer(
    space: &ScaleSpace,
    octave_idx: usize,
    layer: usize,
    threshold: f32,
    edge_threshold: f32,
) -> Vec<Keypoint> {
    let dogs = space.octaves()[octave_idx].dogs();
    let layers = [&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]];
    let curr = layers[1];

    let (cols, rows) = (curr.cols(), curr.rows());
    if cols < 3 || rows < 3 {
        return Vec::new();
    }

    let params = space.params();
    let sigma = params.sigma
        * (octave_idx as f32).exp2()
        * (layer as f32 / params.num_scales as f32).exp2();
    let scale = (1usize << octave_idx) as f32;

    let mut keypoints = Vec::new();
    for y in 1..rows - 1 {
        for x in 1..cols - 1 {
            let value = pixel(curr, x, y);
            if value.abs() <= threshold {
                continue;
            }
            if !is_strict_extremum(layers, x, y, value) {
                continue;
            }
            if is_edge_response(curr, x, y, edge_threshold) {
                continue;
            }
            keypoints.push(Keypoint {
                x: x as f32 * scale,
                y: y as f32 * scale,
                octave: octave_idx,
                layer,
                sigma,
                orientation: None,
            });
        }
    }
    keypoints
}

/// Find contrasted, non-edge extrema of the difference-of-gaussians layers.
///
/// Every interior layer of every octave is scanned, skipping a 1 pixel border.
/// A pixel becomes a candidate when `|v| > contrast_threshold / S`, it is a
/// strict extremum of its 3x3x3 neighbourhood and [`is_edge_response`] rejects
/// it not. Candidates are returned in octave, layer, row, column order for
/// every execution strategy, without orientation.
///
/// # Arguments
///
/// * `space` - The scale space to scan.
/// * `contrast_threshold` - Minimum absolute response, divided by `S`.
/// * `edge_threshold` - Maximum principal curvature ratio `r`.
/// * `strategy` - Execution strategy across layers.
pub fn detect_extrema(
    space: &ScaleSpace,
    contrast_threshold: f32,
    edge_threshold: f32,
    strategy: ExecutionStrategy,
) -> Result<Vec<Keypoint>, SiftError> {
    ensure_positive("contrast_threshold", contrast_threshold as f64)?;
    ensure_positive("edge_threshold", edge_threshold as f64)?;

    let threshold = contrast_threshold / space.params().num_scales as f32;

    let jobs = space
        .octaves()
        .iter()
        .enumerate()
        .flat_map(|(o, octave)| (1..octave.dogs().len().saturating_sub(1)).map(move |l| (o, l)))
        .collect::<Vec<_>>();

    let keypoints = flat_map_ordered(&jobs, strategy, |&(o, l)| {
        scan_layer(space, o, l, threshold, edge_threshold)
    })?;

    log::debug!(
        "extrema: {} candidates over {} layers",
        keypoints.len(),
        jobs.len()
    );

    Ok(keypoints)
}
