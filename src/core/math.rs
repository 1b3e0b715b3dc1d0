//! Mathematical primitives for planar tracking.
//!
//! Angle normalization, angular arithmetic, and the small 3×3 matrix
//! helpers the pose filter needs.

use std::f32::consts::PI;

/// Normalize angle to (-π, π].
///
/// Exactly -π maps to +π so every heading has a single representation.
///
/// # Example
/// ```
/// use drishti_track::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(3.5 * PI) - (-0.5 * PI)).abs() < 1e-6);
/// assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Shortest angular difference from angle `a` to angle `b`.
///
/// Returns the signed angle you need to add to `a` to reach `b`,
/// taking the shortest path around the circle.
///
/// # Example
/// ```
/// use drishti_track::core::math::angle_diff;
/// use std::f32::consts::PI;
///
/// // Crossing the ±π boundary takes the short way
/// let diff = angle_diff(PI - 0.1, -PI + 0.1);
/// assert!((diff - 0.2).abs() < 1e-6);
/// ```
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Multiply two 3×3 row-major matrices.
pub fn mat3_mul(a: &[f32; 9], b: &[f32; 9]) -> [f32; 9] {
    let mut out = [0.0f32; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = a[row * 3] * b[col]
                + a[row * 3 + 1] * b[3 + col]
                + a[row * 3 + 2] * b[6 + col];
        }
    }
    out
}

/// Multiply a 3×3 row-major matrix by a column vector.
#[inline]
pub fn mat3_vec_mul(m: &[f32; 9], v: &[f32; 3]) -> [f32; 3] {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
        m[3] * v[0] + m[4] * v[1] + m[5] * v[2],
        m[6] * v[0] + m[7] * v[1] + m[8] * v[2],
    ]
}

/// Invert a 3×3 row-major matrix via the adjugate.
///
/// Returns `None` when the determinant is too small to divide by.
pub fn mat3_inverse(m: &[f32; 9]) -> Option<[f32; 9]> {
    let c00 = m[4] * m[8] - m[5] * m[7];
    let c01 = m[5] * m[6] - m[3] * m[8];
    let c02 = m[3] * m[7] - m[4] * m[6];

    let det = m[0] * c00 + m[1] * c01 + m[2] * c02;
    if det.abs() < 1e-12 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    Some([
        c00 * inv_det,
        (m[2] * m[7] - m[1] * m[8]) * inv_det,
        (m[1] * m[5] - m[2] * m[4]) * inv_det,
        c01 * inv_det,
        (m[0] * m[8] - m[2] * m[6]) * inv_det,
        (m[2] * m[3] - m[0] * m[5]) * inv_det,
        c02 * inv_det,
        (m[1] * m[6] - m[0] * m[7]) * inv_det,
        (m[0] * m[4] - m[1] * m[3]) * inv_det,
    ])
}

/// 3×3 identity, row-major.
#[inline]
pub fn mat3_identity() -> [f32; 9] {
    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_zero() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_normalize_angle_boundary_open_at_negative_pi() {
        // -π is excluded from the range, +π is included
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
    }

    #[test]
    fn test_normalize_angle_wrap_positive() {
        assert_relative_eq!(normalize_angle(2.0 * PI), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(3.5 * PI), -0.5 * PI, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(4.0 * PI), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_angle_wrap_negative() {
        assert_relative_eq!(normalize_angle(-2.0 * PI), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(-2.5 * PI), -0.5 * PI, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_angle_just_beyond_boundary() {
        let result = normalize_angle(PI + 0.001);
        assert!(result < 0.0, "Should wrap to negative: {}", result);
        assert_relative_eq!(result, -PI + 0.001, epsilon = 1e-5);

        let result = normalize_angle(-PI - 0.001);
        assert!(result > 0.0, "Should wrap to positive: {}", result);
        assert_relative_eq!(result, PI - 0.001, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_diff_same_sign() {
        assert_relative_eq!(angle_diff(0.0, PI / 2.0), PI / 2.0);
        assert_relative_eq!(angle_diff(PI / 2.0, 0.0), -PI / 2.0);
    }

    #[test]
    fn test_angle_diff_crossing_pi() {
        // From just below π to just above -π (should be small positive)
        assert_relative_eq!(angle_diff(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-6);
        // From just above -π to just below π (should be small negative)
        assert_relative_eq!(angle_diff(-PI + 0.1, PI - 0.1), -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_handles_nan_and_infinity() {
        assert!(normalize_angle(f32::NAN).is_nan());
        assert!(normalize_angle(f32::INFINITY).is_nan());
    }

    #[test]
    fn test_mat3_mul_identity() {
        let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let result = mat3_mul(&m, &mat3_identity());
        for i in 0..9 {
            assert_relative_eq!(result[i], m[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mat3_inverse_roundtrip() {
        let m = [2.0, 0.0, 1.0, 0.0, 3.0, 0.0, 1.0, 0.0, 1.0];
        let inv = mat3_inverse(&m).unwrap();
        let product = mat3_mul(&m, &inv);
        let identity = mat3_identity();
        for i in 0..9 {
            assert_relative_eq!(product[i], identity[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_mat3_inverse_singular() {
        // Second row is twice the first
        let m = [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 0.0];
        assert!(mat3_inverse(&m).is_none());
    }

    #[test]
    fn test_mat3_vec_mul() {
        let m = [1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let v = [3.0, 4.0, 1.0];
        let out = mat3_vec_mul(&m, &v);
        assert_relative_eq!(out[0], 5.0);
        assert_relative_eq!(out[1], 4.0);
        assert_relative_eq!(out[2], 1.0);
    }
}
