//! Signal handling for graceful shutdown.

use std::sync::Arc;

use crate::error::{Result, TrackError};
use crate::shared::SharedState;

/// Set up a Ctrl-C handler that raises the shared shutdown flag.
pub fn setup_ctrl_c_handler(shared: Arc<SharedState>) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received");
        shared.signal_shutdown();
    })
    .map_err(|e| TrackError::Other(format!("Failed to install signal handler: {}", e)))
}
