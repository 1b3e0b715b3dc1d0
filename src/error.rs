//! Error types for DrishtiTrack

use thiserror::Error;

/// DrishtiTrack error type.
///
/// Only `Config` is fatal: a miscalibrated node would silently corrupt all
/// downstream fusion, so configuration problems abort startup. Every other
/// class is absorbed at the boundary where it occurs and converted into
/// "no measurement this cycle".
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for TrackError {
    fn from(e: toml::de::Error) -> Self {
        TrackError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(e: serde_json::Error) -> Self {
        TrackError::Protocol(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;
