//! UDP transport to the box.
//!
//! Implements [`DeviceTransport`] on a blocking `std::net::UdpSocket`:
//! send one datagram, wait for one answer.
//!
//! # Timeouts
//!
//! - The send timeout (default 1000 ms) bounds how long `send_to` may block.
//! - The acknowledgement timeout (default 3000 ms) bounds the wait for the
//!   box's answer.  It is reported as [`TransportError::Timeout`], which the
//!   session maps to the receive-timeout error code.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::application::session::{DeviceTransport, TransportError};

/// Largest datagram the box sends back.
const ACK_BUFFER_SIZE: usize = 1024;

/// Socket timeouts for a [`UdpTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpTransportConfig {
    /// How long to wait for an acknowledgement.
    pub ack_timeout: Duration,
    /// How long `send_to` may block.
    pub send_timeout: Duration,
}

impl Default for UdpTransportConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(3000),
            send_timeout: Duration::from_millis(1000),
        }
    }
}

/// Blocking UDP transport bound to an ephemeral local port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    device_addr: SocketAddr,
    ack_timeout: Duration,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Resolves `host:port` and binds a local socket of the matching family.
    ///
    /// IPv4 addresses are preferred when the name resolves to both families.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Resolve`] if the name does not resolve and
    /// [`TransportError::Bind`] if the socket cannot be created or configured.
    pub fn connect(
        host: &str,
        port: u16,
        config: UdpTransportConfig,
    ) -> Result<Self, TransportError> {
        let device_addr = resolve(host, port)?;
        let bind_addr = if device_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(bind_addr).map_err(TransportError::Bind)?;
        socket
            .set_read_timeout(Some(config.ack_timeout))
            .map_err(TransportError::Bind)?;
        socket
            .set_write_timeout(Some(config.send_timeout))
            .map_err(TransportError::Bind)?;

        info!("UDP transport ready for device at {device_addr}");
        Ok(Self {
            socket,
            device_addr,
            ack_timeout: config.ack_timeout,
            buf: vec![0u8; ACK_BUFFER_SIZE],
        })
    }

    /// Resolved address of the box.
    pub fn device_addr(&self) -> SocketAddr {
        self.device_addr
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DeviceTransport for UdpTransport {
    fn transact(&mut self, datagram: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.socket
            .send_to(datagram, self.device_addr)
            .map_err(TransportError::Send)?;

        match self.socket.recv_from(&mut self.buf) {
            Ok((len, src)) => {
                if src != self.device_addr {
                    debug!("acknowledgement came from {src}, expected {}", self.device_addr);
                }
                Ok(self.buf[..len].to_vec())
            }
            Err(e) if is_timeout_error(&e) => Err(TransportError::Timeout(self.ack_timeout)),
            Err(e) => Err(TransportError::Receive(e)),
        }
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let addr = format!("{host}:{port}");
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.clone(),
            source,
        })?
        .collect();

    candidates
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| TransportError::Resolve {
            addr,
            source: io::Error::new(io::ErrorKind::NotFound, "name resolved to no addresses"),
        })
}

/// Returns `true` for OS timeout / would-block errors.
pub(crate) fn is_timeout_error(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_is_timeout_error_recognises_timed_out_and_would_block() {
        // Arrange
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let would_block = io::Error::new(io::ErrorKind::WouldBlock, "would block");

        // Act / Assert
        assert!(is_timeout_error(&timed_out));
        assert!(is_timeout_error(&would_block));
    }

    #[test]
    fn test_is_timeout_error_returns_false_for_other_errors() {
        let e = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_timeout_error(&e));
    }

    #[test]
    fn test_default_config_matches_device_timeouts() {
        let cfg = UdpTransportConfig::default();
        assert_eq!(cfg.ack_timeout, Duration::from_millis(3000));
        assert_eq!(cfg.send_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_resolve_prefers_ipv4_for_literal_address() {
        let addr = resolve("127.0.0.1", 8888).unwrap();
        assert_eq!(addr, "127.0.0.1:8888".parse().unwrap());
    }

    #[test]
    fn test_resolve_rejects_garbage_host() {
        let result = resolve("not a host name", 8888);
        assert!(matches!(result, Err(TransportError::Resolve { .. })));
    }

    #[test]
    fn test_transact_returns_echoed_datagram() {
        // Arrange – a loopback peer that echoes one datagram
        let peer = UdpSocket::bind("127.0.0.1:0").expect("peer bind");
        let peer_port = peer.local_addr().unwrap().port();
        let echo = thread::spawn(move || {
            let mut buf = [0u8; 64];
            let (len, src) = peer.recv_from(&mut buf).expect("peer recv");
            peer.send_to(&buf[..len], src).expect("peer send");
        });
        let mut transport =
            UdpTransport::connect("127.0.0.1", peer_port, UdpTransportConfig::default()).unwrap();

        // Act
        let ack = transport.transact(&[1, 2, 3, 4]).unwrap();

        // Assert
        echo.join().unwrap();
        assert_eq!(ack, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_transact_times_out_when_peer_is_silent() {
        // Arrange
        let peer = UdpSocket::bind("127.0.0.1:0").expect("peer bind");
        let peer_port = peer.local_addr().unwrap().port();
        let config = UdpTransportConfig {
            ack_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let mut transport = UdpTransport::connect("127.0.0.1", peer_port, config).unwrap();

        // Act
        let result = transport.transact(&[0u8; 16]);

        // Assert
        assert!(matches!(
            result,
            Err(TransportError::Timeout(d)) if d == Duration::from_millis(50)
        ));
        drop(peer);
    }
}
