use siftlite_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the feature detection pipeline.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SiftError {
    /// A numeric parameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {value} ({reason})")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the parameter must satisfy.
        reason: &'static str,
    },

    /// The input image cannot be processed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The execution strategy could not run.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// Reject a parameter that is not finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), SiftError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SiftError::InvalidParameter {
            name,
            value,
            reason: "must be finite and > 0",
        });
    }
    Ok(())
}
