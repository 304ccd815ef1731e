//! Receiver for the box's physical-input stream.
//!
//! Once [`DeviceSession::monitor`](crate::application::DeviceSession::monitor)
//! has been called with a port, the box sends one 20-byte datagram to that
//! port on this host whenever the physical mouse or keyboard changes.
//! [`EventMonitor`] binds the port and decodes those datagrams on a dedicated
//! thread.
//!
//! # Two ways to consume events
//!
//! - [`EventMonitor::start`] invokes a callback on the monitor thread.  Keep
//!   the callback short; the next datagram is not read until it returns.
//! - [`EventMonitor::channel`] forwards events to a Tokio `mpsc` channel so an
//!   async task can consume them.
//!
//! # Read timeout
//!
//! The socket is configured with a short read timeout (100 ms by default).
//! On each timeout the thread checks the `running` flag, so
//! [`EventMonitor::shutdown`] returns within one poll interval.
//!
//! # Pairing with a session
//!
//! [`EventMonitor::attach`] points the box at the monitor's actual port (so
//! an ephemeral port works too).  [`EventMonitor::detach`] stops the thread
//! first and only then sends `monitor(0)`.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use kmnet_core::protocol::{decode_monitor_packet, HardKeyboard, HardMouse};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::application::{DeviceError, DeviceSession, DeviceTransport};
use crate::infrastructure::network::is_timeout_error;

/// Default poll interval of the monitor thread.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Capacity of the channel returned by [`EventMonitor::channel`].
pub const CHANNEL_CAPACITY: usize = 256;

/// Error type for monitor start-up.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The UDP socket could not be bound.
    #[error("failed to bind monitor socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The socket could not be configured.
    #[error("failed to configure monitor socket: {0}")]
    Configure(#[source] std::io::Error),

    /// The monitor thread could not be spawned.
    #[error("failed to spawn monitor thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// One decoded monitor datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEvent {
    pub mouse: HardMouse,
    pub keyboard: HardKeyboard,
}

/// Background receiver for the physical-input stream.
///
/// Dropping the monitor shuts it down.
#[derive(Debug)]
pub struct EventMonitor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl EventMonitor {
    /// Binds `0.0.0.0:port` and calls `callback` for every decoded datagram.
    ///
    /// Port 0 binds an ephemeral port; see [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] if the socket or thread cannot be set up.
    pub fn start<F>(port: u16, callback: F) -> Result<Self, MonitorError>
    where
        F: FnMut(HardMouse, HardKeyboard) + Send + 'static,
    {
        Self::start_with_poll_interval(port, DEFAULT_POLL_INTERVAL, callback)
    }

    /// Like [`start`](Self::start) with a custom poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] if the socket or thread cannot be set up.
    pub fn start_with_poll_interval<F>(
        port: u16,
        poll_interval: Duration,
        callback: F,
    ) -> Result<Self, MonitorError>
    where
        F: FnMut(HardMouse, HardKeyboard) + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let socket =
            UdpSocket::bind(addr).map_err(|source| MonitorError::BindFailed { addr, source })?;
        socket
            .set_read_timeout(Some(poll_interval))
            .map_err(MonitorError::Configure)?;
        let local_addr = socket.local_addr().map_err(MonitorError::Configure)?;

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("kmnet-monitor".to_string())
            .spawn(move || monitor_loop(socket, running_clone, callback))
            .map_err(MonitorError::Spawn)?;

        info!("event monitor listening on UDP {local_addr}");
        Ok(Self {
            running,
            handle: Some(handle),
            local_addr,
        })
    }

    /// Binds `0.0.0.0:port` and forwards decoded datagrams to a channel of
    /// [`CHANNEL_CAPACITY`] events.
    ///
    /// The monitor thread never waits on the receiver: events are dropped
    /// while the channel is full or once the receiver is gone, so
    /// [`shutdown`](Self::shutdown) always returns within one poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] if the socket or thread cannot be set up.
    pub fn channel(
        port: u16,
        poll_interval: Duration,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>), MonitorError> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let monitor = Self::start_with_poll_interval(port, poll_interval, move |mouse, keyboard| {
            match tx.try_send(MonitorEvent { mouse, keyboard }) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => debug!("monitor event dropped: channel full"),
                Err(TrySendError::Closed(_)) => debug!("monitor event dropped: receiver closed"),
            }
        })?;
        Ok((monitor, rx))
    }

    /// Address the monitor socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `true` until [`shutdown`](Self::shutdown) has been called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the monitor thread and waits for it to exit.  Calling it again
    /// does nothing.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("event monitor thread panicked");
            }
        }
    }
}

// ── Device streaming ──────────────────────────────────────────────────────────

impl EventMonitor {
    /// Asks the box behind `session` to stream physical input to the port
    /// this monitor is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the box does not acknowledge the command.
    pub fn attach<T: DeviceTransport>(
        &self,
        session: &mut DeviceSession<T>,
    ) -> Result<(), DeviceError> {
        session.monitor(self.local_addr.port())
    }

    /// Stops the monitor thread, then tells the box to stop streaming.
    ///
    /// The thread is stopped even if the box cannot be reached.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the box does not acknowledge `monitor(0)`.
    pub fn detach<T: DeviceTransport>(
        &mut self,
        session: &mut DeviceSession<T>,
    ) -> Result<(), DeviceError> {
        self.shutdown();
        session.monitor(0)
    }
}

impl Drop for EventMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The receive loop executed on the monitor thread.
fn monitor_loop<F>(socket: UdpSocket, running: Arc<AtomicBool>, mut callback: F)
where
    F: FnMut(HardMouse, HardKeyboard),
{
    let mut buf = [0u8; 1024];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("monitor recv error: {e}");
                continue;
            }
        };

        match decode_monitor_packet(&buf[..len]) {
            Ok((mouse, keyboard)) => callback(mouse, keyboard),
            Err(e) => debug!("dropping monitor datagram from {src}: {e}"),
        }
    }

    info!("event monitor stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
