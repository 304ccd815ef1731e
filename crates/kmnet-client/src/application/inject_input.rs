//! Pointer and keyboard injection commands.
//!
//! Each operation updates the session's soft report and sends the complete
//! report to the box.  Motion, wheel and Bezier control points describe a
//! single command and are cleared afterwards even if the send failed, so a
//! retried move never replays stale motion.

use std::thread;
use std::time::Duration;

use kmnet_core::protocol::{
    encode_keyboard_report, encode_mouse_report, CommandId, MouseButton,
};

use super::session::{random_nonce, DeviceError, DeviceSession, DeviceTransport};

impl<T: DeviceTransport> DeviceSession<T> {
    // ── Pointer ──────────────────────────────────────────────────────────────

    /// Moves the pointer by `(x, y)` in one step.
    pub fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        self.mouse.stage_move(x, y);
        self.send_mouse(CommandId::MouseMove, random_nonce())
    }

    /// Presses or releases `button`.
    pub fn mouse_button(&mut self, button: MouseButton, down: bool) -> Result<(), DeviceError> {
        self.mouse.set_button(button, down);
        self.send_mouse(button.command(), random_nonce())
    }

    pub fn mouse_left(&mut self, down: bool) -> Result<(), DeviceError> {
        self.mouse_button(MouseButton::Left, down)
    }

    pub fn mouse_right(&mut self, down: bool) -> Result<(), DeviceError> {
        self.mouse_button(MouseButton::Right, down)
    }

    pub fn mouse_middle(&mut self, down: bool) -> Result<(), DeviceError> {
        self.mouse_button(MouseButton::Middle, down)
    }

    pub fn mouse_side1(&mut self, down: bool) -> Result<(), DeviceError> {
        self.mouse_button(MouseButton::Side1, down)
    }

    pub fn mouse_side2(&mut self, down: bool) -> Result<(), DeviceError> {
        self.mouse_button(MouseButton::Side2, down)
    }

    /// Scrolls the wheel by `wheel` notches.
    pub fn mouse_wheel(&mut self, wheel: i32) -> Result<(), DeviceError> {
        self.mouse.stage_wheel(wheel);
        self.send_mouse(CommandId::MouseWheel, random_nonce())
    }

    /// Sets the button mask, motion and wheel in a single report.
    ///
    /// `button` replaces the held buttons rather than being merged with them.
    pub fn mouse_all(
        &mut self,
        button: i32,
        x: i32,
        y: i32,
        wheel: i32,
    ) -> Result<(), DeviceError> {
        self.mouse.stage_all(button, x, y, wheel);
        self.send_mouse(CommandId::MouseWheel, random_nonce())
    }

    /// Moves by `(x, y)` over roughly `ms` milliseconds, letting the box
    /// interpolate the path.
    pub fn mouse_move_auto(&mut self, x: i32, y: i32, ms: u32) -> Result<(), DeviceError> {
        self.mouse.stage_move(x, y);
        self.send_mouse(CommandId::MouseAutoMove, ms)
    }

    /// Moves by `(x, y)` along a second-order Bezier curve with control
    /// points `p1` and `p2`, taking `ms` milliseconds.
    pub fn mouse_move_bezier(
        &mut self,
        x: i32,
        y: i32,
        ms: u32,
        p1: (i32, i32),
        p2: (i32, i32),
    ) -> Result<(), DeviceError> {
        self.mouse.stage_bezier(x, y, p1, p2);
        self.send_mouse(CommandId::BezierMove, ms)
    }

    fn send_mouse(&mut self, cmd: CommandId, rand: u32) -> Result<(), DeviceError> {
        let payload = encode_mouse_report(&self.mouse.report());
        let result = self.send_report(cmd, rand, &payload);
        self.mouse.clear_transient();
        result
    }

    // ── Keyboard ─────────────────────────────────────────────────────────────

    /// Presses `key` (a HID Usage ID) and sends the full keyboard report.
    pub fn keydown(&mut self, key: impl Into<u8>) -> Result<(), DeviceError> {
        self.keyboard.press(key.into());
        self.send_keyboard()
    }

    /// Releases `key` and sends the full keyboard report.
    pub fn keyup(&mut self, key: impl Into<u8>) -> Result<(), DeviceError> {
        self.keyboard.release(key.into());
        self.send_keyboard()
    }

    /// Presses `key`, holds it for half of `ms`, releases it and waits for the
    /// other half.
    pub fn keypress(&mut self, key: impl Into<u8>, ms: u64) -> Result<(), DeviceError> {
        let key = key.into();
        let half = Duration::from_millis(ms / 2);
        self.keydown(key)?;
        thread::sleep(half);
        self.keyup(key)?;
        thread::sleep(half);
        Ok(())
    }

    fn send_keyboard(&mut self) -> Result<(), DeviceError> {
        let payload = encode_keyboard_report(&self.keyboard.report());
        self.send_report(CommandId::KeyboardAll, random_nonce(), &payload)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
