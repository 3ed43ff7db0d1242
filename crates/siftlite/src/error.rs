use siftlite_geometry::HomographyError;
use siftlite_image::ImageError;
use siftlite_imgproc::SiftError;

/// Errors returned by the siftlite pipeline.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SiftliteError {
    /// Image construction or conversion failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Feature detection, description or matching failed.
    #[error(transparent)]
    Sift(#[from] SiftError),

    /// Homography estimation failed.
    #[error(transparent)]
    Homography(#[from] HomographyError),

    /// A match refers to a point that does not exist.
    #[error("Match {match_idx} refers to point {point_idx} of image {side}, which has {len} points")]
    MatchIndexOutOfBounds {
        /// Position of the offending match.
        match_idx: usize,
        /// Image the index refers to, `a` or `b`.
        side: char,
        /// The out of range point index.
        point_idx: usize,
        /// Number of points of that image.
        len: usize,
    },
}
