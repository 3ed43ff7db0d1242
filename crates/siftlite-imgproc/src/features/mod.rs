//! Feature detection, description and matching.
//!
//! # Available Detectors
//!
//! - **SIFT**: scale-invariant keypoints found as extrema of a difference-of-gaussians
//!   pyramid, with gradient-histogram descriptors.
//!
//! # Matching
//!
//! - [`match_descriptors_ratio`]: brute-force euclidean matching with Lowe's ratio test.

/// Scale-invariant keypoints and descriptors.
pub mod sift;

mod r#match;
pub use r#match::*;
