//! # DrishtiTrack
//!
//! Marker-based vehicle tracker for a camera-tiled arena.
//!
//! N camera nodes each watch one tile of the floor and stream detected
//! triangle-marker contours over TCP. One worker thread per camera turns
//! contours into global poses (marker decode → limits check → offset +
//! homography stitch) and drops them into a per-camera slot. A single
//! fusion coordinator reads the slots at a fixed cadence, feeds an EKF
//! driven by the motion controller's velocity commands, and publishes
//! exactly one pose estimate per cycle over UDP.
//!
//! ## Architecture
//!
//! ```text
//! camera node ──TCP──> CameraWorker ──slot──┐
//! camera node ──TCP──> CameraWorker ──slot──┼──> FusionCoordinator ──UDP──> pose stream
//! camera node ──TCP──> CameraWorker ──slot──┘          ▲
//!                                                      │ UDP
//!                                               motion controller
//! ```
//!
//! ## Layers
//!
//! - [`core`]: math primitives and value types
//! - [`geometry`]: marker decoding and coordinate stitching
//! - [`filter`]: the pose EKF
//! - [`io`]: wire format and network endpoints
//! - [`threads`]: the worker/coordinator topology
//!
//! The estimator never goes quiet: with no detections it publishes the
//! motion-model prediction with growing uncertainty, and detections are
//! absolute fixes, so coverage gaps cost confidence, not availability.

pub mod config;
pub mod core;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod io;
pub mod shared;
pub mod threads;
pub mod utils;

// Flat re-exports for the common surface
pub use config::{DrishtiConfig, NodeConfig};
pub use core::types::{Covariance2D, Point2D, Polygon, Pose2D};
pub use error::{Result, TrackError};
pub use filter::{MeasurementNoise, PoseFilter, PoseFilterConfig, ProcessNoise};
pub use geometry::{extract_marker_pose, NodeTransform};
pub use io::messages::{ControlMessage, DetectionFrame, PoseMessage, WIRE_VERSION};
pub use io::{
    CameraClient, ControlSource, ControlSubscriber, DetectionSource, PosePublisher, PoseSink,
};
pub use shared::{DetectionSlots, SharedState, SlotReading};
pub use threads::{spawn_threads, CameraWorker, CoordinatorConfig, FusionCoordinator, ThreadHandles};
pub use utils::pacer::{CycleOutcome, CyclePacer};
