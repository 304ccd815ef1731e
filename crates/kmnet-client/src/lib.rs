//! kmnet-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does kmnet-client do? (for beginners)
//!
//! A kmnet box is a small network device that plugs into a computer's USB
//! port and pretends to be its keyboard and mouse.  This crate drives such a
//! box over UDP:
//!
//! 1. Connects to the box with the UUID printed on its screen.
//! 2. Injects pointer motion, button presses and key strokes.
//! 3. Optionally asks the box to stream the state of the *physical* keyboard
//!    and mouse back, and receives that stream on a background thread.
//! 4. Configures the box: input masks, network settings, USB identity, LCD.
//!
//! ```no_run
//! use kmnet_client::application::DeviceSession;
//! use kmnet_client::infrastructure::network::{UdpTransport, UdpTransportConfig};
//! use kmnet_core::{DeviceId, HidKeyCode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let transport = UdpTransport::connect("192.168.2.188", 8888, UdpTransportConfig::default())?;
//! let mut session = DeviceSession::connect(transport, DeviceId::parse("0B50E466")?)?;
//! session.mouse_move(100, 100)?;
//! session.keypress(HidKeyCode::KeyH, 50)?;
//! # Ok(())
//! # }
//! ```

/// Application layer: the device session and its commands.
pub mod application;

/// Infrastructure layer: UDP transport, event monitor, configuration file.
pub mod infrastructure;
