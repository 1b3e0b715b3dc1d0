//! Fusion coordinator thread: the single consumer of the detection slots.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DrishtiConfig;
use crate::core::types::Pose2D;
use crate::filter::{MeasurementNoise, PoseFilter, PoseFilterConfig, ProcessNoise};
use crate::io::control_subscriber::ControlSource;
use crate::io::messages::{ControlMessage, PoseMessage};
use crate::io::pose_publisher::PoseSink;
use crate::shared::{DetectionSlots, SharedState};
use crate::utils::pacer::{CycleOutcome, CyclePacer};
use crate::utils::timestamp_us;

/// Everything the coordinator needs from the configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub period: Duration,
    pub process_noise: ProcessNoise,
    pub measurement_noise: MeasurementNoise,
    pub filter: PoseFilterConfig,
}

impl CoordinatorConfig {
    pub fn from_config(config: &DrishtiConfig) -> Self {
        Self {
            period: config.cycle_period(),
            process_noise: config.process_noise(),
            measurement_noise: config.measurement_noise(),
            filter: config.filter_config(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20),
            process_noise: ProcessNoise::default(),
            measurement_noise: MeasurementNoise::default(),
            filter: PoseFilterConfig::default(),
        }
    }
}

/// Merges per-camera detections into one filtered pose stream.
///
/// Runs one cycle per period: read every slot, pick the lowest-index
/// fresh detection, predict with the last control input, update with
/// the detection if there was one, publish. Exactly one pose goes out
/// per cycle whether or not anything was detected.
pub struct FusionCoordinator<P: PoseSink, C: ControlSource> {
    config: CoordinatorConfig,
    slots: Arc<DetectionSlots>,
    shared: Arc<SharedState>,
    sink: P,
    control: C,
    filter: PoseFilter,
    last_control: ControlMessage,
    cycles_since_control: u32,
    last_sequences: Vec<u64>,
    step: u64,
    last_cycle: Option<Instant>,
}

impl<P: PoseSink, C: ControlSource> FusionCoordinator<P, C> {
    pub fn new(
        config: CoordinatorConfig,
        slots: Arc<DetectionSlots>,
        shared: Arc<SharedState>,
        sink: P,
        control: C,
    ) -> Self {
        let slot_count = slots.len();
        let filter = PoseFilter::new(config.filter.clone());
        Self {
            config,
            slots,
            shared,
            sink,
            control,
            filter,
            last_control: ControlMessage::zero(),
            cycles_since_control: u32::MAX, // nothing heard yet
            last_sequences: vec![0; slot_count],
            step: 0,
            last_cycle: None,
        }
    }

    /// Main loop: wait for every camera worker, then cycle until shutdown.
    pub fn run(&mut self) {
        tracing::info!(
            cameras = self.slots.len(),
            period_ms = self.config.period.as_millis() as u64,
            "Fusion coordinator waiting for camera workers"
        );
        while self.shared.workers_ready() < self.slots.len() {
            if self.shared.should_shutdown() {
                tracing::info!("Fusion coordinator shutting down before start");
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        tracing::info!("Fusion coordinator running");

        let mut pacer = CyclePacer::new(self.config.period);
        loop {
            if self.shared.should_shutdown() {
                tracing::info!(steps = self.step, "Fusion coordinator shutting down");
                break;
            }

            self.run_cycle();

            if pacer.wait() == CycleOutcome::Overran {
                tracing::debug!(step = self.step, "fusion cycle overran its period");
            }
        }
    }

    /// Execute exactly one fusion cycle.
    pub fn run_cycle(&mut self) {
        let now = Instant::now();
        let dt = match self.last_cycle {
            Some(last) => (now - last).as_secs_f32(),
            None => self.config.period.as_secs_f32(),
        };
        self.last_cycle = Some(now);

        let measurement = self.select_measurement();

        // A control input that went quiet gets trusted less each cycle
        let staleness = self.cycles_since_control.min(1000) as f32;
        let noise = self.config.process_noise.scaled(1.0 + staleness);
        self.filter.predict(
            self.last_control.linear,
            self.last_control.angular,
            dt,
            &noise,
        );

        if let Some(pose) = measurement {
            self.filter.update(&pose, &self.config.measurement_noise);
        }

        self.step += 1;
        let estimate = self.filter.pose();
        self.sink.publish(&PoseMessage::new(
            estimate.x,
            estimate.y,
            estimate.theta,
            self.step,
            timestamp_us(),
        ));

        match self.control.poll_latest() {
            Some(msg) => {
                tracing::trace!(
                    linear = msg.linear,
                    angular = msg.angular,
                    controller_step = msg.step,
                    "control input accepted"
                );
                self.last_control = msg;
                self.cycles_since_control = 0;
            }
            None => {
                self.cycles_since_control = self.cycles_since_control.saturating_add(1);
            }
        }
    }

    /// First-match selection: lowest-index slot holding a fresh pose.
    ///
    /// Every slot is read every cycle so sequence tracking stays current
    /// even for slots behind the selected one.
    fn select_measurement(&mut self) -> Option<Pose2D> {
        let mut selected = None;
        for index in 0..self.slots.len() {
            let reading = self.slots.read(index);
            let advanced = reading.sequence != self.last_sequences[index];
            if !advanced && reading.sequence > 0 {
                tracing::debug!(camera = index, "slot did not advance, treating as empty");
            }
            if selected.is_none() && advanced {
                if let Some(pose) = reading.pose {
                    selected = Some(pose);
                }
            }
            self.last_sequences[index] = reading.sequence;
        }
        selected
    }

    /// Latest fused estimate.
    pub fn pose(&self) -> Pose2D {
        self.filter.pose()
    }

    /// Uncertainty of the latest estimate.
    pub fn covariance(&self) -> &crate::core::types::Covariance2D {
        self.filter.covariance()
    }

    /// Cycles published so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// The control input currently driving prediction.
    pub fn last_control(&self) -> &ControlMessage {
        &self.last_control
    }

    /// Cycles since a control message was last accepted.
    pub fn cycles_since_control(&self) -> u32 {
        self.cycles_since_control
    }
}
