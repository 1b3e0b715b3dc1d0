//! UDP control input stream.

use std::net::UdpSocket;

use crate::error::Result;
use crate::io::messages::ControlMessage;
use crate::io::wire::decode_payload;

/// Source of control input for the fusion coordinator.
///
/// Production uses [`ControlSubscriber`]; tests script the values.
pub trait ControlSource {
    /// Newest control message received since the last call, if any.
    fn poll_latest(&mut self) -> Option<ControlMessage>;
}

/// Non-blocking UDP listener for velocity commands.
///
/// Drains the socket each poll and keeps only the newest valid message;
/// control is a state, not a queue. Malformed or version-mismatched
/// datagrams are logged and dropped.
pub struct ControlSubscriber {
    socket: UdpSocket,
}

impl ControlSubscriber {
    pub fn new(bind_port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", bind_port))?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    /// Port actually bound (useful when configured with port 0).
    pub fn local_port(&self) -> Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }
}

impl ControlSource for ControlSubscriber {
    fn poll_latest(&mut self) -> Option<ControlMessage> {
        let mut latest = None;
        let mut buf = [0u8; 2048];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, _)) => {
                    if n < 4 {
                        tracing::warn!(len = n, "runt control datagram dropped");
                        continue;
                    }
                    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
                    if 4 + len > n {
                        tracing::warn!(len = n, "truncated control datagram dropped");
                        continue;
                    }
                    match decode_payload::<ControlMessage>(&buf[4..4 + len]) {
                        Ok(msg) => match msg.validate() {
                            Ok(()) => latest = Some(msg),
                            Err(e) => tracing::warn!(error = %e, "invalid control message dropped"),
                        },
                        Err(e) => tracing::warn!(error = %e, "malformed control message dropped"),
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::debug!(error = %e, "control socket read error");
                    break;
                }
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::wire::encode_frame;
    use std::thread;
    use std::time::Duration;

    fn send(to: u16, bytes: &[u8]) {
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(bytes, ("127.0.0.1", to)).unwrap();
    }

    fn command(linear: f32, step: u64) -> ControlMessage {
        ControlMessage {
            linear,
            step,
            ..ControlMessage::zero()
        }
    }

    #[test]
    fn test_empty_socket_yields_none() {
        let mut sub = ControlSubscriber::new(0).unwrap();
        assert_eq!(sub.poll_latest(), None);
    }

    #[test]
    fn test_keeps_newest_of_burst() {
        let mut sub = ControlSubscriber::new(0).unwrap();
        let port = sub.local_port().unwrap();

        send(port, &encode_frame(&command(0.1, 1)).unwrap());
        send(port, &encode_frame(&command(0.2, 2)).unwrap());
        send(port, &encode_frame(&command(0.3, 3)).unwrap());
        thread::sleep(Duration::from_millis(50));

        let msg = sub.poll_latest().unwrap();
        assert_eq!(msg.step, 3);
        // Drained: nothing left for the next cycle
        assert_eq!(sub.poll_latest(), None);
    }

    #[test]
    fn test_malformed_datagrams_are_dropped() {
        let mut sub = ControlSubscriber::new(0).unwrap();
        let port = sub.local_port().unwrap();

        send(port, b"junk");
        send(port, &encode_frame(&command(0.5, 7)).unwrap());
        send(port, &[0, 0, 0, 200, 1, 2, 3]); // truncated
        thread::sleep(Duration::from_millis(50));

        let msg = sub.poll_latest().unwrap();
        assert_eq!(msg.step, 7);
    }
}
