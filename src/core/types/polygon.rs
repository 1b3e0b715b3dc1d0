//! Ordered vertex polygons.
//!
//! Used both for detected marker contours (vertices in camera pixels)
//! and for per-node acceptance regions from the calibration config.

use serde::{Deserialize, Serialize};

use super::pose::Point2D;

/// A simple polygon as an ordered vertex list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2D>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2D>) -> Self {
        Self { vertices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Point-in-polygon test by even-odd ray casting.
    ///
    /// Points exactly on an edge may land on either side; acceptance
    /// regions are drawn with margin so the boundary case never matters.
    pub fn contains(&self, point: &Point2D) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > point.y) != (vj.y > point.y) {
                let x_cross = vj.x + (point.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
