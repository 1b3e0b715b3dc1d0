//! DrishtiTrack - arena vehicle tracker.
//!
//! Loads the calibration config, spawns one worker per camera node plus
//! the fusion coordinator, then monitors until shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use drishti_track::config::DrishtiConfig;
use drishti_track::error::{Result, TrackError};
use drishti_track::shared::{DetectionSlots, SharedState};
use drishti_track::threads::spawn_threads;
use drishti_track::utils::signal::setup_ctrl_c_handler;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drishti_track=info".parse().unwrap()),
        )
        .init();

    // First positional argument is the config path; fall back to
    // drishti.toml in the working directory
    let args: Vec<String> = std::env::args().collect();
    let config_path = if args.len() > 1 {
        args[1].clone()
    } else {
        "drishti.toml".to_string()
    };

    let config_path = Path::new(&config_path);
    if !config_path.exists() {
        return Err(TrackError::Config(format!(
            "config file not found: {} (usage: drishti-track <config.toml>)",
            config_path.display()
        )));
    }
    info!("Loading configuration from {:?}", config_path);
    let config = DrishtiConfig::load(config_path)?;

    info!("DrishtiTrack v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "{} camera nodes, {}ms fusion cycle, publishing to {}",
        config.nodes.len(),
        config.fusion.cycle_ms,
        config.publish.addr
    );

    let slots = Arc::new(DetectionSlots::new(config.nodes.len()));
    let shared = Arc::new(SharedState::new());

    setup_ctrl_c_handler(Arc::clone(&shared))?;

    let handles = spawn_threads(&config, Arc::clone(&slots), Arc::clone(&shared))?;

    // Main thread: monitor until shutdown or a thread death
    let check_interval = Duration::from_millis(200);
    loop {
        std::thread::sleep(check_interval);

        if shared.should_shutdown() {
            break;
        }
        if handles.any_finished() {
            error!("A worker thread exited unexpectedly");
            break;
        }
    }

    shared.signal_shutdown();
    info!("Waiting for threads to finish...");

    for (index, handle) in handles.cameras.into_iter().enumerate() {
        if let Err(e) = handle.join() {
            error!("Camera thread {} panicked: {:?}", index, e);
        }
    }
    if let Err(e) = handles.fusion.join() {
        error!("Fusion thread panicked: {:?}", e);
    }

    info!("DrishtiTrack finished");
    Ok(())
}
