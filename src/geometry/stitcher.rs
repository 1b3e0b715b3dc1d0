//! Local-to-global coordinate stitching.
//!
//! Each camera node sees one tile of the arena. A per-node pixel offset
//! places the tile on the shared pixel grid; a calibrated 3×3 homography
//! then maps grid pixels to arena meters.

use crate::core::types::Pose2D;
use crate::error::{Result, TrackError};

/// Projective divide degenerates below this |w|.
const MIN_PROJECTIVE_W: f32 = 1e-9;

/// Step length in pixels for the finite-difference orientation mapping.
const HEADING_STEP_PX: f32 = 1.0;

/// Calibrated transform from one camera's local frame to the arena frame.
#[derive(Debug, Clone)]
pub struct NodeTransform {
    offset: (f32, f32),
    homography: [f32; 9],
    max_coordinate_m: f32,
}

impl NodeTransform {
    pub fn new(offset: (f32, f32), homography: [f32; 9], max_coordinate_m: f32) -> Self {
        Self {
            offset,
            homography,
            max_coordinate_m,
        }
    }

    /// Map a pose from this node's local pixel frame to arena meters.
    ///
    /// Orientation cannot be carried through a projective map directly
    /// (angles are not preserved), so it is re-derived: map the position
    /// and a one-pixel step along the local heading, then take the
    /// `atan2` of the mapped direction.
    ///
    /// Fails when the projective divide degenerates or the result lands
    /// outside the configured physical bound, which indicates a stale or
    /// wrong calibration rather than a real detection.
    pub fn to_global(&self, local: &Pose2D) -> Result<Pose2D> {
        let px = local.x + self.offset.0;
        let py = local.y + self.offset.1;

        let (gx, gy) = self.project(px, py)?;
        if !gx.is_finite()
            || !gy.is_finite()
            || gx.abs() > self.max_coordinate_m
            || gy.abs() > self.max_coordinate_m
        {
            return Err(TrackError::Transform(format!(
                "stitched position ({:.2}, {:.2}) outside physical bound ±{:.1} m",
                gx, gy, self.max_coordinate_m
            )));
        }

        // The local heading follows math convention over a row-down
        // image, so the pixel-space step negates the y component.
        let (sin_t, cos_t) = local.theta.sin_cos();
        let (hx, hy) = self.project(
            px + cos_t * HEADING_STEP_PX,
            py - sin_t * HEADING_STEP_PX,
        )?;
        let (dx, dy) = (hx - gx, hy - gy);
        if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
            return Err(TrackError::Transform(
                "homography collapses heading direction".to_string(),
            ));
        }
        let theta = dy.atan2(dx);

        Ok(Pose2D::new(gx, gy, theta))
    }

    fn project(&self, x: f32, y: f32) -> Result<(f32, f32)> {
        let h = &self.homography;
        let w = h[6] * x + h[7] * y + h[8];
        if w.abs() < MIN_PROJECTIVE_W || !w.is_finite() {
            return Err(TrackError::Transform(format!(
                "projective divide degenerate at pixel ({:.1}, {:.1})",
                x, y
            )));
        }
        Ok((
            (h[0] * x + h[1] * y + h[2]) / w,
            (h[3] * x + h[4] * y + h[5]) / w,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    /// Pixel grid → meters at `scale` m/px with the row axis flipped,
    /// the usual shape of a camera-over-floor calibration.
    fn flip_scale(scale: f32) -> [f32; 9] {
        [scale, 0.0, 0.0, 0.0, -scale, 0.0, 0.0, 0.0, 1.0]
    }

    #[test]
    fn test_offset_then_scale() {
        let t = NodeTransform::new((100.0, 200.0), flip_scale(0.01), 50.0);
        let local = Pose2D::new(10.0, 20.0, 0.0);
        let global = t.to_global(&local).unwrap();
        assert_relative_eq!(global.x, 1.1, epsilon = 1e-5);
        assert_relative_eq!(global.y, -2.2, epsilon = 1e-5);
    }

    #[test]
    fn test_heading_preserved_through_flip_calibration() {
        // Row-flipping calibration keeps math-convention headings intact
        let t = NodeTransform::new((0.0, 0.0), flip_scale(0.01), 50.0);
        for theta in [0.0, FRAC_PI_2, -FRAC_PI_2, 2.5] {
            let global = t.to_global(&Pose2D::new(50.0, 50.0, theta)).unwrap();
            assert_relative_eq!(global.theta, theta, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_heading_follows_rotated_calibration() {
        // 90° rotation composed with the row flip rotates headings too
        let s = 0.01;
        let h = [0.0, s, 0.0, s, 0.0, 0.0, 0.0, 0.0, 1.0];
        let t = NodeTransform::new((0.0, 0.0), h, 50.0);
        let global = t.to_global(&Pose2D::new(100.0, 100.0, 0.0)).unwrap();
        // local +x direction maps to global +y
        assert_relative_eq!(global.theta, FRAC_PI_2, epsilon = 1e-3);
    }

    #[test]
    fn test_determinism() {
        let t = NodeTransform::new((37.0, -12.0), flip_scale(0.005), 50.0);
        let local = Pose2D::new(123.4, 56.7, 1.234);
        let a = t.to_global(&local).unwrap();
        let b = t.to_global(&local).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_bound_rejected() {
        let t = NodeTransform::new((0.0, 0.0), flip_scale(1.0), 50.0);
        let err = t.to_global(&Pose2D::new(100.0, 0.0, 0.0));
        assert!(matches!(err, Err(TrackError::Transform(_))));
    }

    #[test]
    fn test_degenerate_projective_divide_rejected() {
        // w = 0 along x = 1
        let h = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0];
        let t = NodeTransform::new((0.0, 0.0), h, 50.0);
        let err = t.to_global(&Pose2D::new(1.0, 5.0, 0.0));
        assert!(matches!(err, Err(TrackError::Transform(_))));
    }
}
