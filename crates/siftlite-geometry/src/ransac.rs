use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::homography::{homography_4pt2d, homography_dlt, transfer_error};
use crate::HomographyError;

/// Number of correspondences in a minimal homography sample.
pub const MIN_SAMPLE_SIZE: usize = 4;

/// Parameters for RANSAC homography estimation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RansacParams {
    /// Number of minimal samples to draw.
    pub max_iterations: usize,
    /// Inlier threshold on the transfer error, in pixels.
    pub threshold: f64,
    /// Seed of the sampling generator.
    pub random_seed: u64,
    /// Whether to refit the best model on all of its inliers.
    pub refine: bool,
    /// Whether to score the samples on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 3.0,
            random_seed: 42,
            refine: false,
            parallel: false,
        }
    }
}

impl RansacParams {
    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), HomographyError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(HomographyError::InvalidThreshold(self.threshold));
        }
        if self.max_iterations == 0 {
            return Err(HomographyError::ZeroIterations);
        }
        Ok(())
    }
}

/// Result of a RANSAC homography fit.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RansacResult {
    /// Best homography found, if any sample produced one.
    pub model: Option<[[f64; 3]; 3]>,
    /// Ascending indices of the correspondences within the threshold of `model`.
    pub inliers: Vec<usize>,
}

/// Indices of the correspondences whose transfer error is below `threshold`.
pub fn find_inliers(
    homo: &[[f64; 3]; 3],
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    threshold: f64,
) -> Vec<usize> {
    x1.iter()
        .zip(x2.iter())
        .enumerate()
        .filter(|(_, (a, b))| transfer_error(homo, a, b) < threshold)
        .map(|(i, _)| i)
        .collect()
}

fn count_inliers(homo: &[[f64; 3]; 3], x1: &[[f64; 2]], x2: &[[f64; 2]], threshold: f64) -> usize {
    x1.iter()
        .zip(x2.iter())
        .filter(|(a, b)| transfer_error(homo, a, b) < threshold)
        .count()
}

/// A scored hypothesis: iteration, inlier count and model.
type Hypothesis = (usize, usize, [[f64; 3]; 3]);

/// More inliers win, ties go to the earlier iteration.
fn better(a: Hypothesis, b: Hypothesis) -> Hypothesis {
    if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
        b
    } else {
        a
    }
}

/// Estimate a homography with RANSAC using the 4-point solver.
///
/// Every iteration draws 4 distinct correspondences from a `StdRng` seeded
/// with `params.random_seed`, fits them exactly and counts the
/// correspondences whose transfer error is strictly below `params.threshold`.
/// Degenerate samples are skipped. The model with the most inliers is kept,
/// the earliest one on ties, so the result only depends on the inputs and the
/// seed, whichever scoring mode is used.
///
/// # Arguments
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points, aligned with `x1`.
/// * `params` - The RANSAC parameters.
///
/// # Returns
///
/// The best model and its inliers. With fewer than 4 correspondences, or when
/// every sample is degenerate, the model is `None` and the inliers are empty.
pub fn ransac_homography(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    params: &RansacParams,
) -> Result<RansacResult, HomographyError> {
    if x1.len() != x2.len() {
        return Err(HomographyError::MismatchedLengths(x1.len(), x2.len()));
    }
    params.validate()?;

    let n = x1.len();
    if n < MIN_SAMPLE_SIZE {
        log::debug!("ransac: {n} correspondences, nothing to fit");
        return Ok(RansacResult::default());
    }

    // samples are drawn up front so scoring order does not touch the generator
    let mut rng = StdRng::seed_from_u64(params.random_seed);
    let samples = (0..params.max_iterations)
        .map(|_| {
            let mut sample = [0usize; MIN_SAMPLE_SIZE];
            for (dst, idx) in sample
                .iter_mut()
                .zip(rand::seq::index::sample(&mut rng, n, MIN_SAMPLE_SIZE).iter())
            {
                *dst = idx;
            }
            sample
        })
        .collect::<Vec<_>>();

    let score = |iteration: usize, sample: &[usize; MIN_SAMPLE_SIZE]| -> Option<Hypothesis> {
        let s1 = sample.map(|i| x1[i]);
        let s2 = sample.map(|i| x2[i]);
        let mut homo = [[0.0; 3]; 3];
        homography_4pt2d(&s1, &s2, &mut homo).ok()?;
        let count = count_inliers(&homo, x1, x2, params.threshold);
        (count > 0).then_some((iteration, count, homo))
    };

    let best = if params.parallel {
        samples
            .par_iter()
            .enumerate()
            .filter_map(|(i, s)| score(i, s))
            .reduce_with(better)
    } else {
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| score(i, s))
            .reduce(better)
    };

    let Some((iteration, _, mut model)) = best else {
        log::debug!(
            "ransac: no valid model in {} iterations",
            params.max_iterations
        );
        return Ok(RansacResult::default());
    };

    let mut inliers = find_inliers(&model, x1, x2, params.threshold);

    if params.refine {
        if let Ok(refined) = homography_dlt(
            &inliers.iter().map(|&i| x1[i]).collect::<Vec<_>>(),
            &inliers.iter().map(|&i| x2[i]).collect::<Vec<_>>(),
        ) {
            let refined_inliers = find_inliers(&refined, x1, x2, params.threshold);
            if refined_inliers.len() >= inliers.len() {
                model = refined;
                inliers = refined_inliers;
            }
        }
    }

    log::debug!(
        "ransac: {} of {} correspondences are inliers, best sample at iteration {}",
        inliers.len(),
        n,
        iteration
    );

    Ok(RansacResult {
        model: Some(model),
        inliers,
    })
}
