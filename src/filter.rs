//! Extended Kalman filter over the vehicle pose (x, y, θ).
//!
//! # State Representation
//!
//! - Mean: full pose (x, y, θ), heading normalized to (-π, π]
//! - Covariance: 3×3 matrix P over [x, y, θ]
//!
//! # Algorithm
//!
//! 1. **Prediction**: propagate the mean with the unicycle motion model
//!    driven by the last control input, propagate P through the motion
//!    Jacobian and add process noise
//! 2. **Update**: fuse an absolute pose measurement from the cameras
//!    (H = I), innovation heading via shortest-path angle difference
//!
//! Measurements are absolute, so the filter never drifts unbounded while
//! detections keep arriving; on detection-less cycles only the prediction
//! runs and uncertainty grows.

use crate::core::math::{angle_diff, mat3_inverse, mat3_mul, mat3_vec_mul};
use crate::core::types::{Covariance2D, Pose2D};

/// Process noise parameters for the unicycle prediction step.
#[derive(Debug, Clone, Copy)]
pub struct ProcessNoise {
    /// Position noise variance growth per second (m²/s)
    pub position_var_per_sec: f32,
    /// Heading noise variance growth per second (rad²/s)
    pub heading_var_per_sec: f32,
}

impl ProcessNoise {
    /// Noise inflated by `factor`. Used when the control input driving
    /// the prediction is stale and the model deserves less trust.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            position_var_per_sec: self.position_var_per_sec * factor,
            heading_var_per_sec: self.heading_var_per_sec * factor,
        }
    }
}

impl Default for ProcessNoise {
    fn default() -> Self {
        Self {
            position_var_per_sec: 0.05, // ~22cm/s std dev position drift
            heading_var_per_sec: 0.1,   // ~18°/s std dev heading drift
        }
    }
}

/// Measurement noise for camera pose fixes.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementNoise {
    /// Position measurement variance (m²)
    pub position_var: f32,
    /// Heading measurement variance (rad²)
    pub heading_var: f32,
}

impl Default for MeasurementNoise {
    fn default() -> Self {
        Self {
            position_var: 0.0004, // 2cm std dev
            heading_var: 0.01,    // ~6° std dev
        }
    }
}

/// Configuration for the pose filter.
#[derive(Debug, Clone)]
pub struct PoseFilterConfig {
    /// Variance assigned to x and y before/at the first camera fix (m²)
    pub initial_position_variance: f32,
    /// Variance assigned to θ before/at the first camera fix (rad²)
    pub initial_heading_variance: f32,
}

impl Default for PoseFilterConfig {
    fn default() -> Self {
        Self {
            initial_position_variance: 100.0, // 10m std dev: effectively unknown
            initial_heading_variance: 10.0,
        }
    }
}

/// EKF tracking a single vehicle on the arena floor.
#[derive(Debug)]
pub struct PoseFilter {
    config: PoseFilterConfig,
    mean: Pose2D,
    covariance: Covariance2D,
    initialized: bool,
}

impl PoseFilter {
    /// Create a filter at the origin with maximal configured uncertainty.
    pub fn new(config: PoseFilterConfig) -> Self {
        let covariance = Covariance2D::diagonal(
            config.initial_position_variance,
            config.initial_position_variance,
            config.initial_heading_variance,
        );
        Self {
            config,
            mean: Pose2D::identity(),
            covariance,
            initialized: false,
        }
    }

    /// Current pose estimate.
    #[inline]
    pub fn pose(&self) -> Pose2D {
        self.mean
    }

    /// Current estimate covariance.
    #[inline]
    pub fn covariance(&self) -> &Covariance2D {
        &self.covariance
    }

    /// Whether a camera fix has ever been absorbed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Forget everything and return to the uninitialized prior.
    pub fn reset(&mut self) {
        self.mean = Pose2D::identity();
        self.covariance = Covariance2D::diagonal(
            self.config.initial_position_variance,
            self.config.initial_position_variance,
            self.config.initial_heading_variance,
        );
        self.initialized = false;
    }

    /// Prediction step: unicycle motion model.
    ///
    /// `linear` is forward velocity (m/s), `angular` turn rate (rad/s).
    /// The caller passes noise already scaled for control staleness.
    pub fn predict(&mut self, linear: f32, angular: f32, dt: f32, noise: &ProcessNoise) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        let (sin_t, cos_t) = self.mean.theta.sin_cos();
        let ds = linear * dt;

        self.mean = Pose2D::new(
            self.mean.x + ds * cos_t,
            self.mean.y + ds * sin_t,
            self.mean.theta + angular * dt,
        );

        // Process noise covariance Q, diagonal, scaled by elapsed time
        let q_xx = noise.position_var_per_sec * dt;
        let q_yy = noise.position_var_per_sec * dt;
        let q_tt = noise.heading_var_per_sec * dt;

        // Jacobian of the unicycle model at the prior heading:
        // | 1  0  -v·dt·sin(θ) |
        // | 0  1   v·dt·cos(θ) |
        // | 0  0   1           |
        let f02 = -ds * sin_t;
        let f12 = ds * cos_t;

        // Propagate covariance: P' = F * P * F^T + Q
        // Using the structure of F (identity with modifications in last column)
        let p = self.covariance.as_slice();

        // P * F^T
        let pft00 = p[0] + p[2] * f02;
        let pft01 = p[1] + p[2] * f12;
        let pft02 = p[2];
        let pft10 = p[3] + p[5] * f02;
        let pft11 = p[4] + p[5] * f12;
        let pft12 = p[5];
        let pft20 = p[6] + p[8] * f02;
        let pft21 = p[7] + p[8] * f12;
        let pft22 = p[8];

        // F * (P * F^T)
        let new_p = [
            pft00 + f02 * pft20 + q_xx, // [0,0]
            pft01 + f02 * pft21,        // [0,1]
            pft02 + f02 * pft22,        // [0,2]
            pft10 + f12 * pft20,        // [1,0]
            pft11 + f12 * pft21 + q_yy, // [1,1]
            pft12 + f12 * pft22,        // [1,2]
            pft20,                      // [2,0]
            pft21,                      // [2,1]
            pft22 + q_tt,               // [2,2]
        ];

        self.covariance = Covariance2D::from_array(new_p);
    }

    /// Update step with an absolute pose measurement.
    ///
    /// The first fix ever initializes the mean to the measurement under
    /// the configured initial variance; afterwards the standard EKF
    /// update applies with H = I.
    pub fn update(&mut self, measurement: &Pose2D, noise: &MeasurementNoise) {
        if !self.initialized {
            self.mean = *measurement;
            self.covariance = Covariance2D::diagonal(
                self.config.initial_position_variance,
                self.config.initial_position_variance,
                self.config.initial_heading_variance,
            );
            self.initialized = true;
        }

        let p = *self.covariance.as_slice();

        // Innovation covariance: S = P + R (H = I)
        let mut s = p;
        s[0] += noise.position_var;
        s[4] += noise.position_var;
        s[8] += noise.heading_var;

        // P is PSD and R is strictly positive, so S is invertible in
        // practice; a singular S means the state already blew up and
        // the measurement is ignored rather than amplified.
        let Some(s_inv) = mat3_inverse(&s) else {
            return;
        };

        // Kalman gain: K = P * S^-1
        let k = mat3_mul(&p, &s_inv);

        // Innovation, heading by shortest path around the circle
        let z = [
            measurement.x - self.mean.x,
            measurement.y - self.mean.y,
            angle_diff(self.mean.theta, measurement.theta),
        ];
        let delta = mat3_vec_mul(&k, &z);

        self.mean = Pose2D::new(
            self.mean.x + delta[0],
            self.mean.y + delta[1],
            self.mean.theta + delta[2],
        );

        // P' = (I - K) * P
        let mut ik = [0.0f32; 9];
        for i in 0..9 {
            ik[i] = -k[i];
        }
        ik[0] += 1.0;
        ik[4] += 1.0;
        ik[8] += 1.0;

        self.covariance = Covariance2D::from_array(mat3_mul(&ik, &p));
    }
}
