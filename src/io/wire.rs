//! Wire framing.
//!
//! All TCP and UDP payloads use length-prefixed framing:
//!
//! ```text
//! ┌──────────────────┬────────────────────┐
//! │ Length (4 bytes) │ Payload (variable) │
//! │ Big-endian u32   │ JSON               │
//! └──────────────────┴────────────────────┘
//! ```
//!
//! - Maximum payload size: 1MB; an oversized length prefix means the
//!   stream is desynchronized or hostile, and the connection is dropped
//! - Deserialization failure discards the message, connection stays open

use std::io::{ErrorKind, Read};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TrackError};

/// Maximum payload size accepted or produced (1MB).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Serialize a message and prepend the length prefix.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(TrackError::Protocol(format!(
            "outgoing frame of {} bytes exceeds limit",
            payload.len()
        )));
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Deserialize a frame payload (without the length prefix).
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Incremental frame reader for a non-blocking or timeout-bounded stream.
///
/// Buffers partial reads across calls, so a frame split over several TCP
/// segments is reassembled transparently.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4096),
        }
    }

    /// Drop any partially-read frame. Call after a reconnect, the new
    /// stream starts at a frame boundary.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Try to read one complete frame payload.
    ///
    /// Returns `Ok(None)` when no complete frame is available yet
    /// (WouldBlock / read timeout). A closed stream or an oversized
    /// length prefix is an error; the caller drops the connection.
    pub fn poll<R: Read>(&mut self, stream: &mut R) -> Result<Option<Vec<u8>>> {
        loop {
            if self.buf.len() >= 4 {
                let len =
                    u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]])
                        as usize;
                if len > MAX_FRAME_LEN {
                    return Err(TrackError::Protocol(format!(
                        "incoming frame length {} exceeds limit",
                        len
                    )));
                }
                if self.buf.len() >= 4 + len {
                    let payload = self.buf[4..4 + len].to_vec();
                    self.buf.drain(..4 + len);
                    return Ok(Some(payload));
                }
            }

            let mut chunk = [0u8; 4096];
            match stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(TrackError::Connection(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "stream closed by peer",
                    )))
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(ref e)
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::messages::{ControlMessage, DetectionFrame, WIRE_VERSION};
    use std::io::Cursor;

    #[test]
    fn test_encode_decode() {
        let msg = ControlMessage {
            version: WIRE_VERSION,
            linear: 0.5,
            angular: -0.2,
            step: 7,
        };
        let frame = encode_frame(&msg).unwrap();
        assert_eq!(
            u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize,
            frame.len() - 4
        );
        let back: ControlMessage = decode_payload(&frame[4..]).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_reader_reassembles_full_frame() {
        let msg = DetectionFrame {
            version: WIRE_VERSION,
            frame_number: 3,
            timestamp_us: 99,
            polygons: vec![],
        };
        let frame = encode_frame(&msg).unwrap();
        let mut reader = FrameReader::new();
        let payload = reader.poll(&mut Cursor::new(frame)).unwrap().unwrap();
        let back: DetectionFrame = decode_payload(&payload).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_reader_handles_split_frames() {
        let msg = ControlMessage::zero();
        let frame = encode_frame(&msg).unwrap();

        // Feed the frame two bytes at a time through a reader that
        // signals WouldBlock between chunks
        struct Chunked {
            data: Vec<u8>,
            pos: usize,
            fed: bool,
        }
        impl Read for Chunked {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.fed || self.pos >= self.data.len() {
                    self.fed = false;
                    return Err(std::io::Error::new(ErrorKind::WouldBlock, "later"));
                }
                let n = 2.min(self.data.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
                self.pos += n;
                self.fed = true;
                Ok(n)
            }
        }

        let mut stream = Chunked {
            data: frame,
            pos: 0,
            fed: false,
        };
        let mut reader = FrameReader::new();
        let mut result = None;
        for _ in 0..100 {
            if let Some(payload) = reader.poll(&mut stream).unwrap() {
                result = Some(payload);
                break;
            }
        }
        let back: ControlMessage = decode_payload(&result.unwrap()).unwrap();
        assert_eq!(back, ControlMessage::zero());
    }

    #[test]
    fn test_reader_two_frames_back_to_back() {
        let a = ControlMessage {
            step: 1,
            ..ControlMessage::zero()
        };
        let b = ControlMessage {
            step: 2,
            ..ControlMessage::zero()
        };
        let mut bytes = encode_frame(&a).unwrap();
        bytes.extend(encode_frame(&b).unwrap());

        let mut cursor = Cursor::new(bytes);
        let mut reader = FrameReader::new();
        let first: ControlMessage =
            decode_payload(&reader.poll(&mut cursor).unwrap().unwrap()).unwrap();
        let second: ControlMessage =
            decode_payload(&reader.poll(&mut cursor).unwrap().unwrap()).unwrap();
        assert_eq!(first.step, 1);
        assert_eq!(second.step, 2);
    }

    #[test]
    fn test_reader_rejects_oversized_length() {
        let mut bytes = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let mut reader = FrameReader::new();
        let err = reader.poll(&mut Cursor::new(bytes));
        assert!(matches!(err, Err(TrackError::Protocol(_))));
    }

    #[test]
    fn test_reader_reports_closed_stream() {
        let mut reader = FrameReader::new();
        let err = reader.poll(&mut Cursor::new(Vec::new()));
        assert!(matches!(err, Err(TrackError::Connection(_))));
    }

    #[test]
    fn test_malformed_payload_is_protocol_error() {
        let result: Result<ControlMessage> = decode_payload(b"not json at all");
        assert!(matches!(result, Err(TrackError::Protocol(_))));
    }
}
