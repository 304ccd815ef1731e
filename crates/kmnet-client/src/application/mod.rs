//! Application layer for the kmnet client.
//!
//! # What does the application layer do?
//!
//! - **`session`** – The [`DeviceSession`]: handshake, command index, frame
//!   encoding and acknowledgement handling.  It talks to the box through the
//!   [`DeviceTransport`] trait, which the infrastructure layer implements
//!   with a real UDP socket.
//!
//! - **`inject_input`** – Pointer and keyboard commands (`mouse_move`,
//!   `keydown`, `keypress`, ...).
//!
//! - **`configure_device`** – Everything else the box understands: the
//!   monitor stream switch, input masks, reboot, network and USB identity
//!   settings, and the LCD.

pub mod configure_device;
pub mod inject_input;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use session::{DeviceError, DeviceSession, DeviceTransport, TransportError};
