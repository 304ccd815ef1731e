//! Client-side mirrors of the soft reports held by the box.
//!
//! The box does not remember which buttons or keys a client pressed; every
//! pointer or keyboard command carries the complete report.  The client
//! therefore keeps its own copy, changes one field per operation and sends
//! the whole thing.
//!
//! # Persistent vs. transient fields
//!
//! - Button and modifier state persists between commands: pressing the left
//!   button and then moving the pointer drags.
//! - Motion, wheel and Bezier control points are transient: they describe a
//!   single command and are cleared once it has been sent, whether the send
//!   succeeded or not.
//!
//! # The key-slot queue
//!
//! A keyboard report has ten key slots.  Held keys are packed to the front in
//! press order.  When all ten are taken, the oldest key is dropped to make
//! room; the box then sees it as released.

use serde::{Deserialize, Serialize};

use crate::keymap::hid::ModifierFlags;
use crate::protocol::messages::{MouseButton, SoftKeyboardReport, SoftMouseReport, KEY_SLOTS};

// ── Pointer ───────────────────────────────────────────────────────────────────

/// Soft pointer report plus the rules for updating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseState {
    report: SoftMouseReport,
}

impl MouseState {
    /// Creates a state with no buttons held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report to send for the next command.
    pub fn report(&self) -> SoftMouseReport {
        self.report
    }

    /// Current button bitmask.
    pub fn buttons(&self) -> i32 {
        self.report.button
    }

    /// Presses or releases one button.
    pub fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.report.button |= button.mask();
        } else {
            self.report.button &= !button.mask();
        }
    }

    /// Stages a relative move.
    pub fn stage_move(&mut self, x: i32, y: i32) {
        self.report.x = x;
        self.report.y = y;
    }

    /// Stages a wheel step.
    pub fn stage_wheel(&mut self, wheel: i32) {
        self.report.wheel = wheel;
    }

    /// Replaces the button mask and stages motion and wheel in one go.
    pub fn stage_all(&mut self, button: i32, x: i32, y: i32, wheel: i32) {
        self.report.button = button;
        self.stage_move(x, y);
        self.stage_wheel(wheel);
    }

    /// Stages a second-order Bezier move towards `(x, y)` with control
    /// points `p1` and `p2`.
    pub fn stage_bezier(&mut self, x: i32, y: i32, p1: (i32, i32), p2: (i32, i32)) {
        self.stage_move(x, y);
        self.report.point[0] = p1.0;
        self.report.point[1] = p1.1;
        self.report.point[2] = p2.0;
        self.report.point[3] = p2.1;
    }

    /// Clears motion, wheel and control points.  Buttons stay as they are.
    pub fn clear_transient(&mut self) {
        self.report = SoftMouseReport {
            button: self.report.button,
            ..SoftMouseReport::default()
        };
    }
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Soft keyboard report plus the key-slot queue rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardState {
    report: SoftKeyboardReport,
}

impl KeyboardState {
    /// Creates a state with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report to send for the next command.
    pub fn report(&self) -> SoftKeyboardReport {
        self.report
    }

    /// Current modifier byte.
    pub fn modifiers(&self) -> ModifierFlags {
        ModifierFlags(self.report.ctrl)
    }

    /// Held non-modifier keys in slot order.
    pub fn held_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.report.button.iter().copied().take_while(|&k| k != 0)
    }

    /// Records a key press.
    ///
    /// Modifiers set their bit.  A key already held is left where it is.
    /// Otherwise the key takes the first free slot, or the last slot after
    /// the oldest key is dropped.
    pub fn press(&mut self, key: u8) {
        if let Some(bit) = ModifierFlags::bit_for(key) {
            self.report.ctrl |= bit;
            return;
        }
        let slots = &mut self.report.button;
        if slots.contains(&key) {
            return;
        }
        match slots.iter().position(|&k| k == 0) {
            Some(free) => slots[free] = key,
            None => {
                slots.copy_within(1.., 0);
                slots[KEY_SLOTS - 1] = key;
            }
        }
    }

    /// Records a key release.  Releasing a key that is not held is a no-op.
    pub fn release(&mut self, key: u8) {
        if let Some(bit) = ModifierFlags::bit_for(key) {
            self.report.ctrl &= !bit;
            return;
        }
        let slots = &mut self.report.button;
        if let Some(i) = slots.iter().position(|&k| k == key) {
            slots.copy_within(i + 1.., i);
            slots[KEY_SLOTS - 1] = 0;
        }
    }

    /// Releases every key and modifier.
    pub fn clear(&mut self) {
        self.report = SoftKeyboardReport::default();
    }
}

// ── Masks ─────────────────────────────────────────────────────────────────────

/// Physical inputs the box can hide from the host while still reporting them
/// on the monitor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskTarget {
    Left,
    Right,
    Middle,
    Side1,
    Side2,
    X,
    Y,
    Wheel,
}

impl MaskTarget {
    /// Bit for this input in the mask flags.
    pub fn bit(self) -> u8 {
        match self {
            MaskTarget::Left => 0x01,
            MaskTarget::Right => 0x02,
            MaskTarget::Middle => 0x04,
            MaskTarget::Side1 => 0x08,
            MaskTarget::Side2 => 0x10,
            MaskTarget::X => 0x20,
            MaskTarget::Y => 0x40,
            MaskTarget::Wheel => 0x80,
        }
    }
}

/// Current set of masked physical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaskState {
    flags: u8,
}

impl MaskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Turns masking of `target` on or off and returns the argument for the
    /// mask command.
    pub fn set(&mut self, target: MaskTarget, enabled: bool) -> u32 {
        if enabled {
            self.flags |= target.bit();
        } else {
            self.flags &= !target.bit();
        }
        u32::from(self.flags)
    }

    /// Argument for masking or unmasking one physical key: the current flags
    /// in the low byte, the key in the next byte.
    pub fn keyboard_argument(&self, key: u8) -> u32 {
        u32::from(self.flags) | (u32::from(key) << 8)
    }

    /// Drops every mask.
    pub fn clear(&mut self) {
        self.flags = 0;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
