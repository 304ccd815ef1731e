//! DeviceSession: handshake, command framing and acknowledgements.
//!
//! A session owns one [`DeviceTransport`] and the client-side state the box
//! relies on: the command index, the soft pointer and keyboard reports, and
//! the input mask flags.  The individual device commands live in
//! [`super::inject_input`] and [`super::configure_device`]; this module only
//! knows how to turn a command into a frame and wait for its acknowledgement.
//!
//! # One command, one acknowledgement
//!
//! The protocol is strictly request/response.  Every frame, including the
//! connect handshake, is answered by exactly one datagram from the box, and
//! the next command is not sent until that answer arrives or the transport
//! gives up.

use std::time::Duration;

use kmnet_core::{
    domain::{DeviceId, KeyboardState, MaskState, MouseState},
    protocol::{
        decode_header, encode_encrypted_frame, encode_frame, CommandHeader, CommandId,
        IndexCounter, ProtocolError,
    },
    SessionKey,
};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Error codes ───────────────────────────────────────────────────────────────

/// Socket could not be created or the device address could not be resolved.
pub const ERR_CREATE_SOCKET: i32 = -9000;
/// The command could not be transmitted.
pub const ERR_NET_TX: i32 = -8998;
/// No acknowledgement arrived in time.
pub const ERR_NET_RX_TIMEOUT: i32 = -8997;
/// The command was rejected locally or answered with garbage.
pub const ERR_NET_CMD: i32 = -8996;

// ── Transport seam ────────────────────────────────────────────────────────────

/// Errors produced by a [`DeviceTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// `host:port` did not resolve to a usable address.
    #[error("could not resolve device address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The local UDP socket could not be created or configured.
    #[error("failed to create UDP socket: {0}")]
    Bind(#[source] std::io::Error),

    /// The datagram could not be sent.
    #[error("failed to send command: {0}")]
    Send(#[source] std::io::Error),

    /// Receiving the acknowledgement failed for a reason other than a timeout.
    #[error("failed to receive acknowledgement: {0}")]
    Receive(#[source] std::io::Error),

    /// The box did not answer within the acknowledgement timeout.
    #[error("no acknowledgement within {0:?}")]
    Timeout(Duration),
}

/// Sends one datagram to the box and returns its acknowledgement.
///
/// The production implementation is
/// [`crate::infrastructure::network::UdpTransport`]; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceTransport: Send {
    /// Sends `datagram` and blocks until the acknowledgement arrives.
    fn transact(&mut self, datagram: &[u8]) -> Result<Vec<u8>, TransportError>;
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Errors returned by device commands.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("frame encoding failed: {0}")]
    Protocol(#[from] ProtocolError),

    /// The acknowledgement is too short to hold a command header.
    #[error("acknowledgement of {len} bytes is shorter than a command header")]
    ShortAck { len: usize },

    /// An LCD image buffer is smaller than the region it should cover.
    #[error("{region} image needs {needed} bytes, got {available}")]
    ImageTooShort {
        region: &'static str,
        needed: usize,
        available: usize,
    },
}

impl DeviceError {
    /// Numeric code used by the vendor tooling for this failure.
    pub fn code(&self) -> i32 {
        match self {
            DeviceError::Transport(TransportError::Resolve { .. } | TransportError::Bind(_)) => {
                ERR_CREATE_SOCKET
            }
            DeviceError::Transport(TransportError::Send(_)) => ERR_NET_TX,
            DeviceError::Transport(TransportError::Receive(_) | TransportError::Timeout(_)) => {
                ERR_NET_RX_TIMEOUT
            }
            DeviceError::Protocol(_)
            | DeviceError::ShortAck { .. }
            | DeviceError::ImageTooShort { .. } => ERR_NET_CMD,
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// An authenticated session with one box.
pub struct DeviceSession<T> {
    transport: T,
    device: DeviceId,
    key: SessionKey,
    index: IndexCounter,
    encrypted: bool,
    ack_mismatches: u64,
    pub(super) mouse: MouseState,
    pub(super) keyboard: KeyboardState,
    pub(super) masks: MaskState,
}

impl<T: DeviceTransport> DeviceSession<T> {
    /// Performs the connect handshake over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the handshake is not acknowledged.
    pub fn connect(transport: T, device: DeviceId) -> Result<Self, DeviceError> {
        let mut session = Self {
            transport,
            device,
            key: device.session_key(),
            index: IndexCounter::new(),
            encrypted: false,
            ack_mismatches: 0,
            mouse: MouseState::new(),
            keyboard: KeyboardState::new(),
            masks: MaskState::new(),
        };
        session.handshake()?;
        info!("connected to device {device}");
        Ok(session)
    }

    /// Repeats the handshake, e.g. after the box rebooted.
    ///
    /// Held buttons and keys are forgotten and the command index restarts.
    /// Mask flags are kept.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the handshake is not acknowledged.
    pub fn handshake(&mut self) -> Result<(), DeviceError> {
        self.index.reset();
        self.mouse = MouseState::new();
        self.keyboard = KeyboardState::new();

        let header = CommandHeader::new(self.device.raw(), random_nonce(), 0, CommandId::Connect);
        let frame = encode_frame(&header, &[])?;
        self.exchange(&header, &frame, true)
    }

    /// Identity of the connected box.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Switches pointer and keyboard commands to encrypted frames.
    ///
    /// Configuration commands are always sent in clear text.
    pub fn set_encrypted(&mut self, encrypted: bool) {
        self.encrypted = encrypted;
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Current soft pointer state.
    pub fn mouse_state(&self) -> &MouseState {
        &self.mouse
    }

    /// Current soft keyboard state.
    pub fn keyboard_state(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Current mask flags.
    pub fn mask_state(&self) -> &MaskState {
        &self.masks
    }

    /// Index carried by the last command sent.
    pub fn last_index(&self) -> u32 {
        self.index.current()
    }

    /// Number of clear-text acknowledgements that did not echo their request.
    pub fn ack_mismatches(&self) -> u64 {
        self.ack_mismatches
    }

    /// Sends a clear-text command.
    pub(super) fn send_command(
        &mut self,
        cmd: CommandId,
        rand: u32,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        let header = self.next_header(cmd, rand);
        let frame = encode_frame(&header, payload)?;
        self.exchange(&header, &frame, true)
    }

    /// Sends a pointer or keyboard report, encrypted if the session says so.
    pub(super) fn send_report(
        &mut self,
        cmd: CommandId,
        rand: u32,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        let header = self.next_header(cmd, rand);
        let frame = if self.encrypted {
            encode_encrypted_frame(&header, payload, &self.key)?
        } else {
            encode_frame(&header, payload)?
        };
        self.exchange(&header, &frame, !self.encrypted)
    }

    fn next_header(&self, cmd: CommandId, rand: u32) -> CommandHeader {
        CommandHeader::new(self.device.raw(), rand, self.index.next(), cmd)
    }

    /// Sends `frame` and waits for its acknowledgement.
    ///
    /// The echoed header is only compared against `header` when
    /// `check_echo` is set.  Encrypted frames are acknowledged with cipher
    /// text, which cannot be compared.
    fn exchange(
        &mut self,
        header: &CommandHeader,
        frame: &[u8],
        check_echo: bool,
    ) -> Result<(), DeviceError> {
        debug!(
            "sending {:?} index={} rand=0x{:08X} ({} bytes)",
            header.command(),
            header.indexpts,
            header.rand,
            frame.len()
        );
        let ack = self.transport.transact(frame)?;
        let echoed = decode_header(&ack).map_err(|_| DeviceError::ShortAck { len: ack.len() })?;

        if check_echo && !check_acknowledgement(header, &echoed) {
            self.ack_mismatches += 1;
        }
        Ok(())
    }
}

/// Returns `true` when `echoed` repeats `sent`, logging otherwise.  The
/// firmware has been seen to answer with stale headers, so a mismatch is not
/// an error.
fn check_acknowledgement(sent: &CommandHeader, echoed: &CommandHeader) -> bool {
    match echoed.try_command() {
        Ok(_) if echoed.cmd == sent.cmd && echoed.indexpts == sent.indexpts => return true,
        Ok(cmd) => warn!(
            "acknowledgement mismatch: sent {:?} index={}, got {cmd:?} index={}",
            sent.command(),
            sent.indexpts,
            echoed.indexpts
        ),
        Err(e) => warn!(
            "acknowledgement for {:?} index={} is not a command header: {e}",
            sent.command(),
            sent.indexpts
        ),
    }
    false
}

/// Returns a fresh 32-bit nonce for the `rand` header field.
pub(crate) fn random_nonce() -> u32 {
    rand::thread_rng().gen()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
