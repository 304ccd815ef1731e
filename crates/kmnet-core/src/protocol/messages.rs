//! Command ids, the command header and the report payloads exchanged with
//! the box.
//!
//! Every datagram sent to the box starts with a 16-byte [`CommandHeader`].
//! Pointer and keyboard commands append a full report ([`SoftMouseReport`] or
//! [`SoftKeyboardReport`]); most configuration commands carry their argument
//! inside the header's `rand` field and send no payload at all.
//!
//! All multi-byte integers on the wire are little-endian.

use serde::{Deserialize, Serialize};

use super::codec::ProtocolError;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the command header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of an encrypted frame.  The cipher always works on this many bytes.
pub const ENCRYPTED_FRAME_SIZE: usize = 128;

/// Largest payload the box accepts after the header.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Number of key slots in a keyboard report.
pub const KEY_SLOTS: usize = 10;

/// Number of control-point coordinates in a pointer report.
pub const POINT_SLOTS: usize = 10;

/// Minimum size of a datagram on the monitor channel (8-byte pointer report
/// followed by a 12-byte keyboard report).
pub const MONITOR_PACKET_SIZE: usize = 20;

/// Marker placed in the upper half of `rand` when streaming is enabled.
pub const MONITOR_ENABLE_MARKER: u32 = 0xaa55 << 16;

// ── Command ids ───────────────────────────────────────────────────────────────

/// Command identifiers understood by the box firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum CommandId {
    Connect = 0xaf3c_2828,
    MouseMove = 0xaede_7345,
    MouseLeft = 0x9823_ae8d,
    MouseMiddle = 0x97a3_ae8d,
    MouseRight = 0x238d_8212,
    MouseWheel = 0xffee_ad38,
    MouseAutoMove = 0xaede_7346,
    KeyboardAll = 0x123c_2c2f,
    Reboot = 0xaa88_55aa,
    BezierMove = 0xa238_455a,
    Monitor = 0x2738_8020,
    Debug = 0x2738_2021,
    MaskMouse = 0x2323_4343,
    UnmaskAll = 0x2334_4343,
    SetConfig = 0x1d3d_3323,
    SetVidPid = 0xffed_3232,
    ShowPicture = 0x1233_4883,
    TraceEnable = 0xbbcd_ddac,
}

impl TryFrom<u32> for CommandId {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        match value {
            0xaf3c_2828 => Ok(CommandId::Connect),
            0xaede_7345 => Ok(CommandId::MouseMove),
            0x9823_ae8d => Ok(CommandId::MouseLeft),
            0x97a3_ae8d => Ok(CommandId::MouseMiddle),
            0x238d_8212 => Ok(CommandId::MouseRight),
            0xffee_ad38 => Ok(CommandId::MouseWheel),
            0xaede_7346 => Ok(CommandId::MouseAutoMove),
            0x123c_2c2f => Ok(CommandId::KeyboardAll),
            0xaa88_55aa => Ok(CommandId::Reboot),
            0xa238_455a => Ok(CommandId::BezierMove),
            0x2738_8020 => Ok(CommandId::Monitor),
            0x2738_2021 => Ok(CommandId::Debug),
            0x2323_4343 => Ok(CommandId::MaskMouse),
            0x2334_4343 => Ok(CommandId::UnmaskAll),
            0x1d3d_3323 => Ok(CommandId::SetConfig),
            0xffed_3232 => Ok(CommandId::SetVidPid),
            0x1233_4883 => Ok(CommandId::ShowPicture),
            0xbbcd_ddac => Ok(CommandId::TraceEnable),
            _ => Err(()),
        }
    }
}

// ── Command header ────────────────────────────────────────────────────────────

/// 16-byte header prepended to every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandHeader {
    /// Device identity, taken from the UUID printed on the box screen.
    pub mac: u32,
    /// Random nonce, or the command argument for header-only commands.
    pub rand: u32,
    /// Per-session command index.  The handshake uses 0.
    pub indexpts: u32,
    /// Raw command id (see [`CommandId`]).
    pub cmd: u32,
}

impl CommandHeader {
    /// Builds a header for `cmd`.
    pub fn new(mac: u32, rand: u32, indexpts: u32, cmd: CommandId) -> Self {
        Self {
            mac,
            rand,
            indexpts,
            cmd: cmd as u32,
        }
    }

    /// Returns the typed command id, if the raw value is known.
    pub fn command(&self) -> Option<CommandId> {
        CommandId::try_from(self.cmd).ok()
    }

    /// Like [`command`](Self::command), but reports unknown ids as
    /// [`ProtocolError::UnknownCommand`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownCommand`] carrying the raw id.
    pub fn try_command(&self) -> Result<CommandId, ProtocolError> {
        CommandId::try_from(self.cmd).map_err(|_| ProtocolError::UnknownCommand(self.cmd))
    }
}

// ── Outbound reports ──────────────────────────────────────────────────────────

/// Pointer report sent with every pointer command (56 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoftMouseReport {
    /// Button bitmask (see [`MouseButton`]).
    pub button: i32,
    pub x: i32,
    pub y: i32,
    pub wheel: i32,
    /// Control points for Bezier moves: `[x1, y1, x2, y2, ...]`.
    pub point: [i32; POINT_SLOTS],
}

impl SoftMouseReport {
    /// Encoded size in bytes.
    pub const SIZE: usize = 4 * 4 + 4 * POINT_SLOTS;
}

/// Keyboard report sent with every keyboard command (12 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoftKeyboardReport {
    /// Modifier byte in HID order (see [`crate::keymap::hid::ModifierFlags`]).
    pub ctrl: u8,
    pub reserved: u8,
    /// Held keys, packed to the front, zero-filled.
    pub button: [u8; KEY_SLOTS],
}

impl SoftKeyboardReport {
    /// Encoded size in bytes.
    pub const SIZE: usize = 2 + KEY_SLOTS;
}

/// Pointer buttons and their bit in [`SoftMouseReport::button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
    /// Side button 1 (usually "back").
    Side1 = 0x08,
    /// Side button 2 (usually "forward").
    Side2 = 0x10,
}

impl MouseButton {
    /// Bit for this button in the report bitmask.
    pub fn mask(self) -> i32 {
        self as i32
    }

    /// The command the firmware expects for this button.
    ///
    /// The side buttons have no command of their own and travel on
    /// [`CommandId::MouseLeft`] with the updated bitmask.
    pub fn command(self) -> CommandId {
        match self {
            MouseButton::Left | MouseButton::Side1 | MouseButton::Side2 => CommandId::MouseLeft,
            MouseButton::Right => CommandId::MouseRight,
            MouseButton::Middle => CommandId::MouseMiddle,
        }
    }
}

// ── Inbound monitor records ───────────────────────────────────────────────────

/// Physical pointer state reported on the monitor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardMouse {
    pub report_id: u8,
    /// Button bitmask, same bit layout as [`MouseButton`].
    pub buttons: u8,
    /// Relative motion since the previous report.
    pub x: i16,
    pub y: i16,
    pub wheel: i16,
}

impl HardMouse {
    /// `true` when the report carries no buttons, motion or wheel.
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.x == 0 && self.y == 0 && self.wheel == 0
    }
}

/// Physical keyboard state reported on the monitor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardKeyboard {
    pub report_id: u8,
    /// Modifier byte in HID order.
    pub buttons: u8,
    /// Raw key slots as sent by the box.
    pub keys: [u8; KEY_SLOTS],
}

impl HardKeyboard {
    /// Non-zero key codes in slot order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&k| k != 0)
    }

    /// `true` when no modifier and no key is held.
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.pressed_keys().next().is_none()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_try_from_round_trips_every_variant() {
        for cmd in [
            CommandId::Connect,
            CommandId::MouseMove,
            CommandId::MouseLeft,
            CommandId::MouseMiddle,
            CommandId::MouseRight,
            CommandId::MouseWheel,
            CommandId::MouseAutoMove,
            CommandId::KeyboardAll,
            CommandId::Reboot,
            CommandId::BezierMove,
            CommandId::Monitor,
            CommandId::Debug,
            CommandId::MaskMouse,
            CommandId::UnmaskAll,
            CommandId::SetConfig,
            CommandId::SetVidPid,
            CommandId::ShowPicture,
            CommandId::TraceEnable,
        ] {
            assert_eq!(CommandId::try_from(cmd as u32), Ok(cmd));
        }
    }

    #[test]
    fn test_command_id_try_from_unknown_value_fails() {
        assert!(CommandId::try_from(0xdead_beef).is_err());
    }

    #[test]
    fn test_header_try_command_reports_unknown_id() {
        // Arrange
        let known = CommandHeader::new(1, 0, 1, CommandId::Monitor);
        let unknown = CommandHeader {
            cmd: 0xdead_beef,
            ..known
        };

        // Act / Assert
        assert_eq!(known.try_command(), Ok(CommandId::Monitor));
        assert_eq!(
            unknown.try_command(),
            Err(ProtocolError::UnknownCommand(0xdead_beef))
        );
    }

    #[test]
    fn test_report_sizes_match_firmware_layout() {
        assert_eq!(SoftMouseReport::SIZE, 56);
        assert_eq!(SoftKeyboardReport::SIZE, 12);
    }

    #[test]
    fn test_side_buttons_travel_on_left_button_command() {
        assert_eq!(MouseButton::Side1.command(), CommandId::MouseLeft);
        assert_eq!(MouseButton::Side2.command(), CommandId::MouseLeft);
        assert_eq!(MouseButton::Right.command(), CommandId::MouseRight);
        assert_eq!(MouseButton::Middle.command(), CommandId::MouseMiddle);
    }

    #[test]
    fn test_hard_keyboard_pressed_keys_skips_empty_slots() {
        // Arrange
        let kb = HardKeyboard {
            report_id: 1,
            buttons: 0,
            keys: [0x0B, 0, 0x08, 0, 0, 0, 0, 0, 0, 0],
        };

        // Act
        let keys: Vec<u8> = kb.pressed_keys().collect();

        // Assert
        assert_eq!(keys, vec![0x0B, 0x08]);
        assert!(!kb.is_idle());
    }

    #[test]
    fn test_hard_mouse_is_idle_only_without_activity() {
        assert!(HardMouse::default().is_idle());
        let moved = HardMouse {
            x: -3,
            ..Default::default()
        };
        assert!(!moved.is_idle());
    }
}
