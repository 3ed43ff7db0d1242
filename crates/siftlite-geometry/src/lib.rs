#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::HomographyError;

/// homography solvers and point transfer.
pub mod homography;

/// small fixed-size linear algebra helpers.
pub mod linalg;

/// robust homography estimation.
pub mod ransac;
