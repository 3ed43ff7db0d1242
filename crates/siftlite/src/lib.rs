#![deny(missing_docs)]
#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

mod error;
pub use error::SiftliteError;

mod pipeline;
pub use pipeline::*;

#[doc(inline)]
pub use siftlite_image as image;

#[doc(inline)]
pub use siftlite_imgproc as imgproc;

#[doc(inline)]
pub use siftlite_geometry as geometry;

pub use siftlite_geometry::ransac::RansacParams;
pub use siftlite_image::Image;
pub use siftlite_imgproc::features::sift::{Descriptor, Keypoint, SiftConfig};
pub use siftlite_imgproc::features::Match;
