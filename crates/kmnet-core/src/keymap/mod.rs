//! Key codes understood by the box.
//!
//! The box emulates a USB keyboard, so the canonical representation is the
//! USB HID Usage ID (page 0x07, Keyboard/Keypad).

pub mod hid;

pub use hid::{HidKeyCode, ModifierFlags, UnknownKeyName};
