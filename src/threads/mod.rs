//! Thread topology.
//!
//! One camera worker per configured node plus a single fusion
//! coordinator. All of them share the detection slots and the shutdown
//! flag; the main thread owns the join handles.

mod camera;
mod fusion;

pub use camera::CameraWorker;
pub use fusion::{CoordinatorConfig, FusionCoordinator};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::DrishtiConfig;
use crate::error::Result;
use crate::io::camera_client::CameraClient;
use crate::io::control_subscriber::ControlSubscriber;
use crate::io::pose_publisher::PosePublisher;
use crate::shared::{DetectionSlots, SharedState};

/// Thread handles for the running system.
pub struct ThreadHandles {
    pub cameras: Vec<JoinHandle<()>>,
    pub fusion: JoinHandle<()>,
}

impl ThreadHandles {
    /// Whether any thread has exited.
    pub fn any_finished(&self) -> bool {
        self.fusion.is_finished() || self.cameras.iter().any(|h| h.is_finished())
    }
}

/// Spawn all threads and return handles.
pub fn spawn_threads(
    config: &DrishtiConfig,
    slots: Arc<DetectionSlots>,
    shared: Arc<SharedState>,
) -> Result<ThreadHandles> {
    let period = config.cycle_period();
    let max_coordinate = config.stitching.max_coordinate_m;

    let mut cameras = Vec::with_capacity(config.nodes.len());
    for (index, node) in config.nodes.iter().enumerate() {
        let client = CameraClient::new(
            &node.camera_addr,
            node.connect_timeout(),
            node.read_timeout(),
        )?;
        let transform = node.transform(max_coordinate);
        let limits = node.limits_polygon();
        let worker_slots = Arc::clone(&slots);
        let worker_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name(format!("camera-{}", index))
            .spawn(move || {
                let mut worker = CameraWorker::new(
                    index,
                    client,
                    transform,
                    limits,
                    worker_slots,
                    worker_shared,
                    period,
                );
                worker.run();
            })
            .expect("Failed to spawn camera thread");
        cameras.push(handle);
    }

    let sink = PosePublisher::new(&config.publish.addr)?;
    let control = ControlSubscriber::new(config.control.bind_port)?;
    let coordinator_config = CoordinatorConfig::from_config(config);
    let fusion_slots = Arc::clone(&slots);
    let fusion_shared = Arc::clone(&shared);

    let fusion = thread::Builder::new()
        .name("fusion".into())
        .spawn(move || {
            let mut coordinator = FusionCoordinator::new(
                coordinator_config,
                fusion_slots,
                fusion_shared,
                sink,
                control,
            );
            coordinator.run();
        })
        .expect("Failed to spawn fusion thread");

    Ok(ThreadHandles { cameras, fusion })
}
