//! TCP subscriber to one camera node's detection stream.

use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use crate::error::{Result, TrackError};
use crate::io::messages::DetectionFrame;
use crate::io::wire::{decode_payload, FrameReader};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Source of detection frames for a camera worker.
///
/// Production uses [`CameraClient`]; tests substitute scripted frames.
pub trait DetectionSource {
    /// Fetch the newest complete frame, draining anything queued behind
    /// it. `Ok(None)` means nothing arrived this cycle.
    fn poll_latest(&mut self) -> Result<Option<DetectionFrame>>;
}

/// TCP client for a camera node.
///
/// Connects lazily and reconnects with exponential backoff, so a camera
/// that is down at startup or dies mid-run just produces empty cycles
/// until it returns. Reads are bounded by the configured timeout; the
/// worker's cycle can stretch by at most that much.
pub struct CameraClient {
    addr: SocketAddr,
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<TcpStream>,
    reader: FrameReader,
    backoff: Duration,
    next_attempt: Instant,
}

impl CameraClient {
    pub fn new(addr: &str, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let addr = addr
            .parse()
            .map_err(|_| TrackError::Config(format!("invalid camera address: {}", addr)))?;
        Ok(Self {
            addr,
            connect_timeout,
            read_timeout,
            stream: None,
            reader: FrameReader::new(),
            backoff: INITIAL_BACKOFF,
            next_attempt: Instant::now(),
        })
    }

    fn ensure_connected(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }
        if Instant::now() < self.next_attempt {
            return false;
        }
        match TcpStream::connect_timeout(&self.addr, self.connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(self.read_timeout)).ok();
                stream.set_nodelay(true).ok();
                self.reader.reset();
                self.stream = Some(stream);
                self.backoff = INITIAL_BACKOFF;
                tracing::info!(camera = %self.addr, "connected to camera node");
                true
            }
            Err(e) => {
                tracing::warn!(
                    camera = %self.addr,
                    error = %e,
                    backoff_ms = self.backoff.as_millis() as u64,
                    "camera connect failed, backing off"
                );
                self.next_attempt = Instant::now() + self.backoff;
                self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
                false
            }
        }
    }

    fn disconnect(&mut self) {
        self.stream = None;
        self.reader.reset();
        self.next_attempt = Instant::now() + self.backoff;
        self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
    }
}

impl DetectionSource for CameraClient {
    fn poll_latest(&mut self) -> Result<Option<DetectionFrame>> {
        if !self.ensure_connected() {
            return Ok(None);
        }

        let mut latest: Option<DetectionFrame> = None;
        let mut failure: Option<TrackError> = None;
        if let Some(stream) = self.stream.as_mut() {
            loop {
                match self.reader.poll(stream) {
                    Ok(Some(payload)) => match decode_payload::<DetectionFrame>(&payload) {
                        Ok(frame) => match frame.validate() {
                            Ok(()) => latest = Some(frame),
                            Err(e) => {
                                tracing::warn!(camera = %self.addr, error = %e, "discarding invalid frame");
                            }
                        },
                        Err(e) => {
                            tracing::warn!(camera = %self.addr, error = %e, "discarding malformed frame");
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        if let Some(e) = failure {
            tracing::warn!(camera = %self.addr, error = %e, "camera stream lost, will reconnect");
            self.disconnect();
            return Err(e);
        }
        Ok(latest)
    }
}
