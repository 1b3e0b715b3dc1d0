//! Core data types.

pub mod covariance;
pub mod polygon;
pub mod pose;

pub use covariance::Covariance2D;
pub use polygon::Polygon;
pub use pose::{Point2D, Pose2D};
