//! Wire message types.
//!
//! Every message carries an explicit version so a peer speaking a
//! different protocol revision is rejected instead of misread.

use serde::{Deserialize, Serialize};

use crate::core::types::Polygon;
use crate::error::{Result, TrackError};

/// Protocol revision spoken by this build.
pub const WIRE_VERSION: u16 = 1;

/// One detection frame from a camera node: every candidate contour it
/// found in that capture, in local pixel coordinates. An empty list is
/// a valid frame meaning "nothing detected".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub version: u16,
    /// Camera's own frame counter
    pub frame_number: u64,
    /// Capture time, microseconds since the epoch
    pub timestamp_us: u64,
    pub polygons: Vec<Polygon>,
}

impl DetectionFrame {
    pub fn validate(&self) -> Result<()> {
        if self.version != WIRE_VERSION {
            return Err(TrackError::Protocol(format!(
                "detection frame version {} (expected {})",
                self.version, WIRE_VERSION
            )));
        }
        for polygon in &self.polygons {
            if polygon
                .vertices
                .iter()
                .any(|v| !v.x.is_finite() || !v.y.is_finite())
            {
                return Err(TrackError::Protocol(
                    "detection frame contains non-finite vertices".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Fused pose estimate, published once per fusion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseMessage {
    pub version: u16,
    /// Arena position in meters
    pub x: f32,
    pub y: f32,
    /// Heading in radians, (-π, π]
    pub theta: f32,
    /// Fusion cycle counter, strictly increasing
    pub step: u64,
    pub timestamp_us: u64,
}

impl PoseMessage {
    pub fn new(x: f32, y: f32, theta: f32, step: u64, timestamp_us: u64) -> Self {
        Self {
            version: WIRE_VERSION,
            x,
            y,
            theta,
            step,
            timestamp_us,
        }
    }
}

/// Velocity command from the motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub version: u16,
    /// Forward velocity in m/s
    pub linear: f32,
    /// Turn rate in rad/s
    pub angular: f32,
    /// Controller's own step counter, carried for diagnostics
    pub step: u64,
}

impl ControlMessage {
    /// The standstill command assumed before any controller speaks.
    pub fn zero() -> Self {
        Self {
            version: WIRE_VERSION,
            linear: 0.0,
            angular: 0.0,
            step: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != WIRE_VERSION {
            return Err(TrackError::Protocol(format!(
                "control message version {} (expected {})",
                self.version, WIRE_VERSION
            )));
        }
        if !self.linear.is_finite() || !self.angular.is_finite() {
            return Err(TrackError::Protocol(
                "control message has non-finite velocities".to_string(),
            ));
        }
        Ok(())
    }
}
