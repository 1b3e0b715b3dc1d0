//! Pose covariance over (x, y, θ).

use serde::{Deserialize, Serialize};

/// 3×3 covariance matrix for a planar pose, stored row-major:
///
/// ```text
/// [ var_x    cov_xy   cov_xθ ]
/// [ cov_xy   var_y    cov_yθ ]
/// [ cov_xθ   cov_yθ   var_θ  ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariance2D {
    matrix: [f32; 9],
}

impl Covariance2D {
    /// Diagonal covariance from individual variances.
    pub fn diagonal(var_x: f32, var_y: f32, var_theta: f32) -> Self {
        let mut matrix = [0.0; 9];
        matrix[0] = var_x;
        matrix[4] = var_y;
        matrix[8] = var_theta;
        Self { matrix }
    }

    /// From a full row-major 3×3 array.
    pub fn from_array(matrix: [f32; 9]) -> Self {
        Self { matrix }
    }

    /// Row-major view of the full matrix.
    #[inline]
    pub fn as_slice(&self) -> &[f32; 9] {
        &self.matrix
    }

    /// Sum of the diagonal. The scalar uncertainty measure used for
    /// confidence monitoring.
    #[inline]
    pub fn trace(&self) -> f32 {
        self.matrix[0] + self.matrix[4] + self.matrix[8]
    }

    #[inline]
    pub fn var_x(&self) -> f32 {
        self.matrix[0]
    }

    #[inline]
    pub fn var_y(&self) -> f32 {
        self.matrix[4]
    }

    #[inline]
    pub fn var_theta(&self) -> f32 {
        self.matrix[8]
    }
}

impl Default for Covariance2D {
    fn default() -> Self {
        Self::diagonal(0.0, 0.0, 0.0)
    }
}
