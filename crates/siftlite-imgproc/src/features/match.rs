use crate::error::SiftError;

/// A correspondence between two descriptor sets.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Match {
    /// Index into the first descriptor set.
    pub idx_a: usize,
    /// Index into the second descriptor set.
    pub idx_b: usize,
    /// Euclidean distance between the two descriptors.
    pub distance: f32,
}

/// Squared euclidean distance between two float descriptors.
#[inline]
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

/// Match float descriptors using brute-force euclidean distance and Lowe's ratio test.
///
/// For each descriptor in `descriptors_a`, finds the nearest and second nearest
/// neighbours in `descriptors_b` and keeps the pair when
/// `best < ratio · second_best`. Equal distances resolve to the lowest index.
///
/// # Arguments
///
/// * `descriptors_a` - First set of N-d descriptors.
/// * `descriptors_b` - Second set of N-d descriptors.
/// * `ratio` - Ratio test threshold in `(0, 1]`.
///
/// # Returns
///
/// Matches ordered by `idx_a`. Fewer than two descriptors in `descriptors_b`
/// make the ratio test undefined and yield no matches.
///
/// # Example
///
/// ```
/// use siftlite_imgproc::features::match_descriptors_ratio;
///
/// let a = [[0.0f32, 1.0], [1.0, 0.0]];
/// let b = [[1.0f32, 0.1], [0.0, 0.9], [5.0, 5.0]];
/// let matches = match_descriptors_ratio(&a, &b, 0.75).unwrap();
///
/// assert_eq!(matches.len(), 2);
/// assert_eq!((matches[0].idx_a, matches[0].idx_b), (0, 1));
/// assert_eq!((matches[1].idx_a, matches[1].idx_b), (1, 0));
/// ```
pub fn match_descriptors_ratio<const N: usize>(
    descriptors_a: &[[f32; N]],
    descriptors_b: &[[f32; N]],
    ratio: f32,
) -> Result<Vec<Match>, SiftError> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(SiftError::InvalidParameter {
            name: "ratio",
            value: ratio as f64,
            reason: "must be in (0, 1]",
        });
    }

    if descriptors_a.is_empty() || descriptors_b.len() < 2 {
        return Ok(vec![]);
    }

    let mut matches = Vec::new();
    for (i, da) in descriptors_a.iter().enumerate() {
        let mut best_j = 0usize;
        let mut best = f32::INFINITY;
        let mut second = f32::INFINITY;

        for (j, db) in descriptors_b.iter().enumerate() {
            let dist = squared_distance(da, db).sqrt();
            if dist < best {
                second = best;
                best = dist;
                best_j = j;
            } else if dist < second {
                second = dist;
            }
        }

        if best < ratio * second {
            matches.push(Match {
                idx_a: i,
                idx_b: best_j,
                distance: best,
            });
        }
    }

    log::debug!(
        "matcher: {} of {} descriptors passed the ratio test against {}",
        matches.len(),
        descriptors_a.len(),
        descriptors_b.len()
    );

    Ok(matches)
}
