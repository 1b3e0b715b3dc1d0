//! UDP pose output stream.

use std::net::{SocketAddr, UdpSocket};

use crate::error::{Result, TrackError};
use crate::io::messages::PoseMessage;
use crate::io::wire::encode_frame;

/// Sink for fused pose estimates.
///
/// Production uses [`PosePublisher`]; tests capture messages in memory.
pub trait PoseSink {
    /// Publish one estimate. Must never block the fusion cycle.
    fn publish(&mut self, msg: &PoseMessage);
}

/// Fire-and-forget UDP unicast publisher.
///
/// Send failures are logged and dropped; a missing consumer must not
/// stall or kill the tracker.
pub struct PosePublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl PosePublisher {
    pub fn new(target: &str) -> Result<Self> {
        let target = target
            .parse()
            .map_err(|_| TrackError::Config(format!("invalid publish address: {}", target)))?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, target })
    }
}

impl PoseSink for PosePublisher {
    fn publish(&mut self, msg: &PoseMessage) {
        match encode_frame(msg) {
            Ok(frame) => {
                if let Err(e) = self.socket.send_to(&frame, self.target) {
                    tracing::debug!(error = %e, "pose send failed, dropping");
                }
            }
            Err(e) => tracing::warn!(error = %e, "pose serialization failed"),
        }
    }
}
