//! Triangle marker pose extraction.
//!
//! The vehicle carries an isosceles triangle marker: two equal legs meet
//! at the front vertex, the shorter base spans the rear. Camera nodes
//! deliver the detected contour as a polygon in pixel coordinates.

use crate::core::types::{Point2D, Polygon, Pose2D};
use crate::error::{Result, TrackError};

/// Sides shorter than this (in pixels) mean the contour collapsed.
const MIN_SIDE_LEN: f32 = 1e-3;

/// Leg pairs closer than this to the next-best pair are ambiguous.
const LEG_AMBIGUITY_EPS: f32 = 1e-6;

/// Extract the vehicle pose from a detected marker contour.
///
/// The two most similar sides are taken as the legs and their common
/// vertex as the front; the base midpoint is the position. Orientation
/// points from the base midpoint toward the front vertex, with the
/// vertical component negated because camera rows count downward.
///
/// Rejects contours that are not triangles, have a degenerate side, or
/// are too close to equilateral to orient (ambiguous leg pair).
pub fn extract_marker_pose(polygon: &Polygon) -> Result<Pose2D> {
    let v = &polygon.vertices;
    if v.len() != 3 {
        return Err(TrackError::Detection(format!(
            "marker contour has {} vertices, expected 3",
            v.len()
        )));
    }

    // Side i is opposite vertex i.
    let sides = [
        v[1].distance(&v[2]),
        v[0].distance(&v[2]),
        v[0].distance(&v[1]),
    ];
    if sides.iter().any(|&s| s < MIN_SIDE_LEN || !s.is_finite()) {
        return Err(TrackError::Detection(
            "degenerate marker contour (collapsed side)".to_string(),
        ));
    }

    // Pair (i, j) of sides shares the vertex opposite the remaining side.
    // The front vertex is the one the two legs meet at.
    let pair_diffs = [
        ((sides[0] - sides[1]).abs(), 2usize), // legs opposite v0, v1 meet at v2
        ((sides[0] - sides[2]).abs(), 1usize),
        ((sides[1] - sides[2]).abs(), 0usize),
    ];
    let mut ordered = pair_diffs;
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    if ordered[1].0 - ordered[0].0 < LEG_AMBIGUITY_EPS {
        return Err(TrackError::Detection(
            "ambiguous marker orientation (near-equilateral contour)".to_string(),
        ));
    }
    let front_idx = ordered[0].1;

    let front = v[front_idx];
    let (base_a, base_b) = match front_idx {
        0 => (v[1], v[2]),
        1 => (v[0], v[2]),
        _ => (v[0], v[1]),
    };
    let mid = Point2D::new((base_a.x + base_b.x) / 2.0, (base_a.y + base_b.y) / 2.0);

    // Image rows grow downward; negate the vertical component so theta
    // follows the usual math convention.
    let theta = (-(front.y - mid.y)).atan2(front.x - mid.x);

    Ok(Pose2D::new(mid.x, mid.y, theta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn triangle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Polygon {
        Polygon::new(vec![
            Point2D::new(a.0, a.1),
            Point2D::new(b.0, b.1),
            Point2D::new(c.0, c.1),
        ])
    }

    #[test]
    fn test_marker_pointing_up_in_image() {
        // Base on the row-0 line, apex below it in image coordinates.
        // Rows count downward, so the marker points "up" in math terms.
        let m = triangle((0.0, 0.0), (2.0, 0.0), (1.0, -1.732));
        let pose = extract_marker_pose(&m).unwrap();
        assert_relative_eq!(pose.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pose.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(pose.theta, FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_marker_pointing_right() {
        // Legs meet at (3, 1); base from (0, 0) to (0, 2)
        let m = triangle((0.0, 0.0), (0.0, 2.0), (3.0, 1.0));
        let pose = extract_marker_pose(&m).unwrap();
        assert_relative_eq!(pose.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(pose.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pose.theta, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_marker_pointing_down_in_image() {
        let m = triangle((0.0, 0.0), (2.0, 0.0), (1.0, 3.0));
        let pose = extract_marker_pose(&m).unwrap();
        assert_relative_eq!(pose.theta, -FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_vertex_order_does_not_matter() {
        let a = extract_marker_pose(&triangle((0.0, 0.0), (2.0, 0.0), (1.0, -3.0))).unwrap();
        let b = extract_marker_pose(&triangle((1.0, -3.0), (0.0, 0.0), (2.0, 0.0))).unwrap();
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.theta, b.theta, epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_wrong_vertex_count() {
        let square = Polygon::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ]);
        assert!(extract_marker_pose(&square).is_err());
        assert!(extract_marker_pose(&Polygon::new(vec![])).is_err());
    }

    #[test]
    fn test_rejects_collapsed_triangle() {
        let m = triangle((0.0, 0.0), (0.0, 0.0), (1.0, 1.0));
        assert!(matches!(
            extract_marker_pose(&m),
            Err(TrackError::Detection(_))
        ));
    }

    #[test]
    fn test_rejects_equilateral() {
        // All three leg pairs equally similar, no way to pick a front
        let h = 3.0f32.sqrt();
        let m = triangle((0.0, 0.0), (2.0, 0.0), (1.0, h));
        assert!(extract_marker_pose(&m).is_err());
    }

    #[test]
    fn test_rotated_marker() {
        // Base midpoint (0.5, -0.5), front vertex two units away along
        // the image direction (-0.7071, -0.7071): 135° in math terms.
        let m = triangle(
            (1.2071, -1.2071),
            (-0.2071, 0.2071),
            (-0.9142, -1.9142),
        );
        let pose = extract_marker_pose(&m).unwrap();
        assert_relative_eq!(pose.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(pose.y, -0.5, epsilon = 1e-4);
        assert_relative_eq!(pose.theta, 3.0 * PI / 4.0, epsilon = 1e-3);
    }
}
