//! Detection geometry: marker decoding and coordinate stitching.

pub mod marker;
pub mod stitcher;

pub use marker::extract_marker_pose;
pub use stitcher::NodeTransform;
