#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
/// color transformations module.
pub mod color;

/// error types of the image processing operations.
pub mod error;
pub use error::SiftError;

/// feature detection, description and matching module.
pub mod features;

/// image filtering module.
pub mod filter;

/// module containing parallization utilities.
pub mod parallel;

/// gaussian and difference-of-gaussians pyramids.
pub mod pyramid;
