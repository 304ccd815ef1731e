//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! The box speaks raw HID: a keyboard report carries up to ten Usage IDs and
//! one modifier byte, exactly like the report a physical USB keyboard sends.
//! Every key code accepted by [`crate::domain::KeyboardState`] and reported
//! by the monitor channel is one of these values.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10.
//!
//! # Modifiers are not keys
//!
//! The eight modifier keys (0xE0–0xE7) never occupy a key slot.  Pressing one
//! sets a bit in the modifier byte instead; see [`ModifierFlags`].
//!
//! # Names
//!
//! Every key also has a name taken from the DOM `KeyboardEvent.code`
//! vocabulary (`KeyH`, `ShiftLeft`, `ArrowUp`, ...).  The CLI parses these, so
//! users can write `kmnet press KeyH` instead of `kmnet press 0x0B`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// USB HID Usage ID for keyboard keys (page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,
    ContextMenu = 0x65,
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

/// Every key with its `KeyboardEvent.code` name, in Usage ID order.
const KEY_TABLE: &[(HidKeyCode, &str)] = &[
    (HidKeyCode::KeyA, "KeyA"),
    (HidKeyCode::KeyB, "KeyB"),
    (HidKeyCode::KeyC, "KeyC"),
    (HidKeyCode::KeyD, "KeyD"),
    (HidKeyCode::KeyE, "KeyE"),
    (HidKeyCode::KeyF, "KeyF"),
    (HidKeyCode::KeyG, "KeyG"),
    (HidKeyCode::KeyH, "KeyH"),
    (HidKeyCode::KeyI, "KeyI"),
    (HidKeyCode::KeyJ, "KeyJ"),
    (HidKeyCode::KeyK, "KeyK"),
    (HidKeyCode::KeyL, "KeyL"),
    (HidKeyCode::KeyM, "KeyM"),
    (HidKeyCode::KeyN, "KeyN"),
    (HidKeyCode::KeyO, "KeyO"),
    (HidKeyCode::KeyP, "KeyP"),
    (HidKeyCode::KeyQ, "KeyQ"),
    (HidKeyCode::KeyR, "KeyR"),
    (HidKeyCode::KeyS, "KeyS"),
    (HidKeyCode::KeyT, "KeyT"),
    (HidKeyCode::KeyU, "KeyU"),
    (HidKeyCode::KeyV, "KeyV"),
    (HidKeyCode::KeyW, "KeyW"),
    (HidKeyCode::KeyX, "KeyX"),
    (HidKeyCode::KeyY, "KeyY"),
    (HidKeyCode::KeyZ, "KeyZ"),
    (HidKeyCode::Digit1, "Digit1"),
    (HidKeyCode::Digit2, "Digit2"),
    (HidKeyCode::Digit3, "Digit3"),
    (HidKeyCode::Digit4, "Digit4"),
    (HidKeyCode::Digit5, "Digit5"),
    (HidKeyCode::Digit6, "Digit6"),
    (HidKeyCode::Digit7, "Digit7"),
    (HidKeyCode::Digit8, "Digit8"),
    (HidKeyCode::Digit9, "Digit9"),
    (HidKeyCode::Digit0, "Digit0"),
    (HidKeyCode::Enter, "Enter"),
    (HidKeyCode::Escape, "Escape"),
    (HidKeyCode::Backspace, "Backspace"),
    (HidKeyCode::Tab, "Tab"),
    (HidKeyCode::Space, "Space"),
    (HidKeyCode::Minus, "Minus"),
    (HidKeyCode::Equal, "Equal"),
    (HidKeyCode::BracketLeft, "BracketLeft"),
    (HidKeyCode::BracketRight, "BracketRight"),
    (HidKeyCode::Backslash, "Backslash"),
    (HidKeyCode::Semicolon, "Semicolon"),
    (HidKeyCode::Quote, "Quote"),
    (HidKeyCode::Backquote, "Backquote"),
    (HidKeyCode::Comma, "Comma"),
    (HidKeyCode::Period, "Period"),
    (HidKeyCode::Slash, "Slash"),
    (HidKeyCode::CapsLock, "CapsLock"),
    (HidKeyCode::F1, "F1"),
    (HidKeyCode::F2, "F2"),
    (HidKeyCode::F3, "F3"),
    (HidKeyCode::F4, "F4"),
    (HidKeyCode::F5, "F5"),
    (HidKeyCode::F6, "F6"),
    (HidKeyCode::F7, "F7"),
    (HidKeyCode::F8, "F8"),
    (HidKeyCode::F9, "F9"),
    (HidKeyCode::F10, "F10"),
    (HidKeyCode::F11, "F11"),
    (HidKeyCode::F12, "F12"),
    (HidKeyCode::PrintScreen, "PrintScreen"),
    (HidKeyCode::ScrollLock, "ScrollLock"),
    (HidKeyCode::Pause, "Pause"),
    (HidKeyCode::Insert, "Insert"),
    (HidKeyCode::Home, "Home"),
    (HidKeyCode::PageUp, "PageUp"),
    (HidKeyCode::Delete, "Delete"),
    (HidKeyCode::End, "End"),
    (HidKeyCode::PageDown, "PageDown"),
    (HidKeyCode::ArrowRight, "ArrowRight"),
    (HidKeyCode::ArrowLeft, "ArrowLeft"),
    (HidKeyCode::ArrowDown, "ArrowDown"),
    (HidKeyCode::ArrowUp, "ArrowUp"),
    (HidKeyCode::NumLock, "NumLock"),
    (HidKeyCode::NumpadDivide, "NumpadDivide"),
    (HidKeyCode::NumpadMultiply, "NumpadMultiply"),
    (HidKeyCode::NumpadSubtract, "NumpadSubtract"),
    (HidKeyCode::NumpadAdd, "NumpadAdd"),
    (HidKeyCode::NumpadEnter, "NumpadEnter"),
    (HidKeyCode::Numpad1, "Numpad1"),
    (HidKeyCode::Numpad2, "Numpad2"),
    (HidKeyCode::Numpad3, "Numpad3"),
    (HidKeyCode::Numpad4, "Numpad4"),
    (HidKeyCode::Numpad5, "Numpad5"),
    (HidKeyCode::Numpad6, "Numpad6"),
    (HidKeyCode::Numpad7, "Numpad7"),
    (HidKeyCode::Numpad8, "Numpad8"),
    (HidKeyCode::Numpad9, "Numpad9"),
    (HidKeyCode::Numpad0, "Numpad0"),
    (HidKeyCode::NumpadDecimal, "NumpadDecimal"),
    (HidKeyCode::ContextMenu, "ContextMenu"),
    (HidKeyCode::ControlLeft, "ControlLeft"),
    (HidKeyCode::ShiftLeft, "ShiftLeft"),
    (HidKeyCode::AltLeft, "AltLeft"),
    (HidKeyCode::MetaLeft, "MetaLeft"),
    (HidKeyCode::ControlRight, "ControlRight"),
    (HidKeyCode::ShiftRight, "ShiftRight"),
    (HidKeyCode::AltRight, "AltRight"),
    (HidKeyCode::MetaRight, "MetaRight"),
];

impl HidKeyCode {
    /// Converts a raw Usage ID, or `None` if the value has no variant.
    pub fn from_u8(value: u8) -> Option<Self> {
        KEY_TABLE
            .iter()
            .find(|(key, _)| *key as u8 == value)
            .map(|(key, _)| *key)
    }

    /// Raw Usage ID as carried in a keyboard report.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// `KeyboardEvent.code` name of this key.
    pub fn name(self) -> &'static str {
        KEY_TABLE
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, name)| *name)
            .unwrap_or("Unidentified")
    }

    /// Returns `true` for the eight modifier keys (0xE0–0xE7).
    pub fn is_modifier(self) -> bool {
        ModifierFlags::bit_for(self.as_u8()).is_some()
    }

    /// Bit this key occupies in the modifier byte, if it is a modifier.
    pub fn modifier_bit(self) -> Option<u8> {
        ModifierFlags::bit_for(self.as_u8())
    }
}

impl From<HidKeyCode> for u8 {
    fn from(key: HidKeyCode) -> u8 {
        key.as_u8()
    }
}

impl fmt::Display for HidKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a key name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0:?}")]
pub struct UnknownKeyName(pub String);

impl FromStr for HidKeyCode {
    type Err = UnknownKeyName;

    /// Accepts `KeyboardEvent.code` names (case-insensitive), bare letters
    /// and digits (`h`, `7`), and hexadecimal Usage IDs (`0x0B`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unknown = || UnknownKeyName(s.to_string());

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            let raw = u8::from_str_radix(hex, 16).map_err(|_| unknown())?;
            return HidKeyCode::from_u8(raw).ok_or_else(unknown);
        }

        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let name = if c.is_ascii_alphabetic() {
                format!("Key{}", c.to_ascii_uppercase())
            } else if c.is_ascii_digit() {
                format!("Digit{c}")
            } else {
                return Err(unknown());
            };
            return name.parse();
        }

        KEY_TABLE
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(trimmed))
            .map(|(key, _)| *key)
            .ok_or_else(unknown)
    }
}

/// The modifier byte of a keyboard report, in HID bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// Bit for a raw modifier Usage ID (0xE0 -> bit 0 ... 0xE7 -> bit 7).
    pub fn bit_for(usage: u8) -> Option<u8> {
        match usage {
            0xE0..=0xE7 => Some(1 << (usage - 0xE0)),
            _ => None,
        }
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(&self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either Meta (Win/Cmd/Super) modifier is active.
    pub fn meta(&self) -> bool {
        self.0 & (Self::LEFT_META | Self::RIGHT_META) != 0
    }
}
