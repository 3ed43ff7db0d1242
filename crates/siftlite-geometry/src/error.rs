/// Errors returned by the homography solvers and the RANSAC estimator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    /// The source and destination point arrays differ in length.
    #[error("Mismatched point arrays: {0} source points and {1} destination points")]
    MismatchedLengths(usize, usize),

    /// The solver needs more correspondences than were given.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences given.
        actual: usize,
    },

    /// The inlier threshold is not a finite positive number.
    #[error("Invalid inlier threshold {0}, must be finite and > 0")]
    InvalidThreshold(f64),

    /// RANSAC was asked to run zero iterations.
    #[error("RANSAC needs at least one iteration")]
    ZeroIterations,

    /// The correspondences do not determine a proper homography.
    #[error("Degenerate sample, the homography is singular")]
    DegenerateSample,
}
