//! Network I/O: camera subscription, pose publishing, control input.

pub mod camera_client;
pub mod control_subscriber;
pub mod messages;
pub mod pose_publisher;
pub mod wire;

pub use camera_client::{CameraClient, DetectionSource};
pub use control_subscriber::{ControlSource, ControlSubscriber};
pub use pose_publisher::{PosePublisher, PoseSink};
