//! Camera worker thread: one per camera node.

use std::sync::Arc;
use std::time::Duration;

use crate::core::types::{Point2D, Polygon, Pose2D};
use crate::error::{Result, TrackError};
use crate::geometry::{extract_marker_pose, NodeTransform};
use crate::io::camera_client::DetectionSource;
use crate::shared::{DetectionSlots, SharedState};
use crate::utils::pacer::CyclePacer;
use crate::utils::timestamp_us;

/// Fixed-period acquisition loop for one camera node.
///
/// Each cycle fetches the newest detection frame, tries to turn one of
/// its polygons into a global pose, and writes the result (or "empty")
/// to this worker's slot. Detection and transform failures downgrade to
/// empty slots; nothing a camera sends can take the worker down.
pub struct CameraWorker<S: DetectionSource> {
    index: usize,
    source: S,
    transform: NodeTransform,
    limits: Polygon,
    slots: Arc<DetectionSlots>,
    shared: Arc<SharedState>,
    period: Duration,
}

impl<S: DetectionSource> CameraWorker<S> {
    pub fn new(
        index: usize,
        source: S,
        transform: NodeTransform,
        limits: Polygon,
        slots: Arc<DetectionSlots>,
        shared: Arc<SharedState>,
        period: Duration,
    ) -> Self {
        Self {
            index,
            source,
            transform,
            limits,
            slots,
            shared,
            period,
        }
    }

    /// Main loop. Returns when the shutdown flag is raised.
    pub fn run(&mut self) {
        tracing::info!(camera = self.index, "Camera worker started");
        self.shared.mark_worker_ready();

        let mut pacer = CyclePacer::new(self.period);
        loop {
            if self.shared.should_shutdown() {
                tracing::info!(camera = self.index, "Camera worker shutting down");
                break;
            }

            let pose = self.acquire();
            self.slots.write(self.index, pose, timestamp_us());

            pacer.wait();
        }
    }

    /// One acquisition: newest frame → first polygon that survives the
    /// full pipeline. `None` when the camera saw nothing usable.
    fn acquire(&mut self) -> Option<Pose2D> {
        let frame = match self.source.poll_latest() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(camera = self.index, error = %e, "detection feed error");
                return None;
            }
        };

        for polygon in &frame.polygons {
            match Self::global_pose(&self.transform, &self.limits, polygon) {
                Ok(pose) => return Some(pose),
                Err(e) => {
                    tracing::debug!(camera = self.index, error = %e, "polygon rejected");
                }
            }
        }
        None
    }

    fn global_pose(
        transform: &NodeTransform,
        limits: &Polygon,
        polygon: &Polygon,
    ) -> Result<Pose2D> {
        let local = extract_marker_pose(polygon)?;
        if !limits.contains(&Point2D::new(local.x, local.y)) {
            return Err(TrackError::Detection(
                "marker outside node acceptance region".to_string(),
            ));
        }
        transform.to_global(&local)
    }
}
