//! Configuration loading for DrishtiTrack
//!
//! Calibration mistakes corrupt every downstream estimate, so `load`
//! validates the whole file and refuses to start on any problem.

use crate::core::types::{Point2D, Polygon};
use crate::error::{Result, TrackError};
use crate::filter::{MeasurementNoise, PoseFilterConfig, ProcessNoise};
use crate::geometry::NodeTransform;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct DrishtiConfig {
    #[serde(default)]
    pub fusion: FusionSettings,
    #[serde(default)]
    pub publish: PublishSettings,
    #[serde(default)]
    pub control: ControlSettings,
    #[serde(default)]
    pub stitching: StitchingSettings,
    /// One entry per camera node, in slot order
    pub nodes: Vec<NodeConfig>,
}

/// Fusion cycle timing and filter noise parameters
#[derive(Clone, Debug, Deserialize)]
pub struct FusionSettings {
    /// Fusion cycle period in milliseconds (default: 20)
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,

    /// Position process noise variance per second (m²/s)
    #[serde(default = "default_process_position_var")]
    pub process_position_var_per_sec: f32,

    /// Heading process noise variance per second (rad²/s)
    #[serde(default = "default_process_heading_var")]
    pub process_heading_var_per_sec: f32,

    /// Camera fix position variance (m²)
    #[serde(default = "default_measurement_position_var")]
    pub measurement_position_var: f32,

    /// Camera fix heading variance (rad²)
    #[serde(default = "default_measurement_heading_var")]
    pub measurement_heading_var: f32,

    /// Position variance before the first camera fix (m²)
    #[serde(default = "default_initial_position_var")]
    pub initial_position_variance: f32,

    /// Heading variance before the first camera fix (rad²)
    #[serde(default = "default_initial_heading_var")]
    pub initial_heading_variance: f32,
}

/// Pose output stream settings
#[derive(Clone, Debug, Deserialize)]
pub struct PublishSettings {
    /// UDP address the pose stream is sent to (default: 127.0.0.1:5600)
    #[serde(default = "default_publish_addr")]
    pub addr: String,
}

/// Control input stream settings
#[derive(Clone, Debug, Deserialize)]
pub struct ControlSettings {
    /// UDP port to listen on for control messages (default: 5601)
    #[serde(default = "default_control_port")]
    pub bind_port: u16,
}

/// Stitching sanity bounds
#[derive(Clone, Debug, Deserialize)]
pub struct StitchingSettings {
    /// Reject stitched positions beyond this many meters from the
    /// arena origin (default: 50.0)
    #[serde(default = "default_max_coordinate")]
    pub max_coordinate_m: f32,
}

/// Calibration for one camera node
#[derive(Clone, Debug, Deserialize)]
pub struct NodeConfig {
    /// TCP address of the camera node's detection stream
    pub camera_addr: String,

    /// Connect timeout in milliseconds (default: 2000)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Per-cycle read timeout in milliseconds (default: 5)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Pixel offset [dx, dy] of this tile on the shared pixel grid
    pub offset: [f32; 2],

    /// Row-major 3×3 homography from grid pixels to arena meters
    pub homography: [f32; 9],

    /// Acceptance region in local pixels; detections outside are dropped
    pub limits: Vec<[f32; 2]>,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            cycle_ms: default_cycle_ms(),
            process_position_var_per_sec: default_process_position_var(),
            process_heading_var_per_sec: default_process_heading_var(),
            measurement_position_var: default_measurement_position_var(),
            measurement_heading_var: default_measurement_heading_var(),
            initial_position_variance: default_initial_position_var(),
            initial_heading_variance: default_initial_heading_var(),
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            addr: default_publish_addr(),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            bind_port: default_control_port(),
        }
    }
}

impl Default for StitchingSettings {
    fn default() -> Self {
        Self {
            max_coordinate_m: default_max_coordinate(),
        }
    }
}

// Default value functions
fn default_cycle_ms() -> u64 {
    20
}
fn default_process_position_var() -> f32 {
    0.05
}
fn default_process_heading_var() -> f32 {
    0.1
}
fn default_measurement_position_var() -> f32 {
    0.0004
}
fn default_measurement_heading_var() -> f32 {
    0.01
}
fn default_initial_position_var() -> f32 {
    100.0
}
fn default_initial_heading_var() -> f32 {
    10.0
}
fn default_publish_addr() -> String {
    "127.0.0.1:5600".to_string()
}
fn default_control_port() -> u16 {
    5601
}
fn default_max_coordinate() -> f32 {
    50.0
}
fn default_connect_timeout_ms() -> u64 {
    2000
}
fn default_read_timeout_ms() -> u64 {
    5
}

impl DrishtiConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackError::Config(format!("Failed to read config file: {}", e)))?;
        let config: DrishtiConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject any configuration that could corrupt tracking.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(TrackError::Config(
                "at least one [[nodes]] entry is required".to_string(),
            ));
        }
        if self.fusion.cycle_ms == 0 {
            return Err(TrackError::Config("fusion.cycle_ms must be > 0".to_string()));
        }
        let variances = [
            ("process_position_var_per_sec", self.fusion.process_position_var_per_sec),
            ("process_heading_var_per_sec", self.fusion.process_heading_var_per_sec),
            ("measurement_position_var", self.fusion.measurement_position_var),
            ("measurement_heading_var", self.fusion.measurement_heading_var),
            ("initial_position_variance", self.fusion.initial_position_variance),
            ("initial_heading_variance", self.fusion.initial_heading_variance),
        ];
        for (name, value) in variances {
            if !value.is_finite() || value <= 0.0 {
                return Err(TrackError::Config(format!(
                    "fusion.{} must be finite and > 0, got {}",
                    name, value
                )));
            }
        }
        if self.publish.addr.parse::<SocketAddr>().is_err() {
            return Err(TrackError::Config(format!(
                "publish.addr is not a valid socket address: {}",
                self.publish.addr
            )));
        }
        if !self.stitching.max_coordinate_m.is_finite() || self.stitching.max_coordinate_m <= 0.0 {
            return Err(TrackError::Config(
                "stitching.max_coordinate_m must be finite and > 0".to_string(),
            ));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            node.validate()
                .map_err(|e| match e {
                    TrackError::Config(msg) => {
                        TrackError::Config(format!("nodes[{}]: {}", idx, msg))
                    }
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Fusion cycle period.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.fusion.cycle_ms)
    }

    /// Process noise for the pose filter (unscaled).
    pub fn process_noise(&self) -> ProcessNoise {
        ProcessNoise {
            position_var_per_sec: self.fusion.process_position_var_per_sec,
            heading_var_per_sec: self.fusion.process_heading_var_per_sec,
        }
    }

    /// Measurement noise for camera fixes.
    pub fn measurement_noise(&self) -> MeasurementNoise {
        MeasurementNoise {
            position_var: self.fusion.measurement_position_var,
            heading_var: self.fusion.measurement_heading_var,
        }
    }

    /// Initial uncertainty for the pose filter.
    pub fn filter_config(&self) -> PoseFilterConfig {
        PoseFilterConfig {
            initial_position_variance: self.fusion.initial_position_variance,
            initial_heading_variance: self.fusion.initial_heading_variance,
        }
    }
}

impl NodeConfig {
    fn validate(&self) -> Result<()> {
        if self.camera_addr.is_empty() {
            return Err(TrackError::Config("camera_addr is empty".to_string()));
        }
        if self.camera_addr.parse::<SocketAddr>().is_err() {
            return Err(TrackError::Config(format!(
                "camera_addr is not a valid socket address: {}",
                self.camera_addr
            )));
        }
        if self.offset.iter().any(|v| !v.is_finite()) {
            return Err(TrackError::Config("offset must be finite".to_string()));
        }
        if self.homography.iter().any(|v| !v.is_finite()) {
            return Err(TrackError::Config("homography must be finite".to_string()));
        }
        // A homography with zero determinant maps the whole tile to a
        // line; that is a broken calibration, not a usable transform.
        let h = &self.homography;
        let det = h[0] * (h[4] * h[8] - h[5] * h[7]) - h[1] * (h[3] * h[8] - h[5] * h[6])
            + h[2] * (h[3] * h[7] - h[4] * h[6]);
        if det.abs() < 1e-9 {
            return Err(TrackError::Config("homography is singular".to_string()));
        }
        if self.limits.len() < 3 {
            return Err(TrackError::Config(format!(
                "limits needs at least 3 vertices, got {}",
                self.limits.len()
            )));
        }
        if self.limits.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TrackError::Config("limits must be finite".to_string()));
        }
        Ok(())
    }

    /// The node's local→global transform.
    pub fn transform(&self, max_coordinate_m: f32) -> NodeTransform {
        NodeTransform::new(
            (self.offset[0], self.offset[1]),
            self.homography,
            max_coordinate_m,
        )
    }

    /// The node's acceptance region as a polygon.
    pub fn limits_polygon(&self) -> Polygon {
        Polygon::new(
            self.limits
                .iter()
                .map(|v| Point2D::new(v[0], v[1]))
                .collect(),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
