//! # kmnet-core
//!
//! Shared library for kmnet containing the wire protocol codec, the frame
//! cipher, the client-side report state and HID key codes.
//!
//! It has zero dependencies on OS APIs or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A kmnet box sits between a physical keyboard/mouse and a host computer and
//! presents itself to the host as a USB keyboard and mouse.  Over Ethernet it
//! accepts UDP commands that inject pointer motion, button presses and key
//! strokes, and it can stream the state of the physical devices back.
//!
//! This crate is the socket-free foundation:
//!
//! - **`protocol`** – How bytes travel over the network.  Every command is a
//!   16-byte header followed by an optional report, optionally encrypted.
//!
//! - **`crypto`** – The XXTEA block cipher used for encrypted frames.
//!
//! - **`domain`** – Device identity and the soft reports the client keeps on
//!   behalf of the box (held buttons, the ten-slot key queue, input masks).
//!
//! - **`keymap`** – USB HID Usage IDs, the key codes the box understands.

pub mod crypto;
pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `kmnet_core::DeviceId` instead of `kmnet_core::domain::device_id::DeviceId`.
pub use crypto::SessionKey;
pub use domain::{DeviceId, DeviceIdError, KeyboardState, MaskState, MaskTarget, MouseState};
pub use keymap::hid::{HidKeyCode, ModifierFlags};
pub use protocol::codec::ProtocolError;
pub use protocol::messages::{CommandHeader, CommandId, HardKeyboard, HardMouse, MouseButton};
