//! Monitor, mask, system and LCD commands.
//!
//! These commands carry their argument in the header's `rand` field (plus a
//! small payload for a few of them) and are always sent in clear text.
//!
//! # Input masks (for beginners)
//!
//! A mask hides one physical input from the host while the box keeps
//! reporting it on the monitor channel.  Masking the X axis, for example,
//! freezes the host cursor horizontally while the client still sees the real
//! mouse motion and can decide what to inject instead.
//!
//! # LCD
//!
//! The box has a 128x160 RGB565 screen.  Images are streamed one
//! 1024-byte row band at a time (four pixel rows of 128 pixels), with the
//! band's starting pixel row in `rand`.

use std::net::Ipv4Addr;

use kmnet_core::{
    domain::MaskTarget,
    protocol::{CommandId, MONITOR_ENABLE_MARKER},
};
use tracing::info;

use super::session::{random_nonce, DeviceError, DeviceSession, DeviceTransport};

/// LCD width in pixels.
pub const LCD_WIDTH: usize = 128;
/// LCD height in pixels.
pub const LCD_HEIGHT: usize = 160;
/// Height of the bottom region written by [`DeviceSession::lcd_picture_bottom`].
pub const LCD_BOTTOM_HEIGHT: usize = 80;
/// Bytes sent per LCD command (four rows of RGB565 pixels).
pub const LCD_BAND_BYTES: usize = 1024;

/// Bits of the `trace_enable` value that fit beside the curve kind.
pub const TRACE_VALUE_MASK: u32 = 0x00FF_FFFF;

const LCD_BAND_ROWS: usize = LCD_BAND_BYTES / (LCD_WIDTH * 2);

impl<T: DeviceTransport> DeviceSession<T> {
    // ── Monitor ──────────────────────────────────────────────────────────────

    /// Asks the box to stream physical input to UDP `port` on this host.
    /// Port 0 stops the stream.
    pub fn monitor(&mut self, port: u16) -> Result<(), DeviceError> {
        let rand = if port == 0 {
            0
        } else {
            MONITOR_ENABLE_MARKER | u32::from(port)
        };
        self.send_command(CommandId::Monitor, rand, &[])?;
        if port == 0 {
            info!("device monitor stream disabled");
        } else {
            info!("device monitor stream enabled on port {port}");
        }
        Ok(())
    }

    // ── Masks ────────────────────────────────────────────────────────────────

    /// Turns masking of one physical pointer input on or off.
    pub fn mask_mouse(&mut self, target: MaskTarget, enabled: bool) -> Result<(), DeviceError> {
        let rand = self.masks.set(target, enabled);
        self.send_command(CommandId::MaskMouse, rand, &[])
    }

    pub fn mask_mouse_left(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Left, enabled)
    }

    pub fn mask_mouse_right(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Right, enabled)
    }

    pub fn mask_mouse_middle(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Middle, enabled)
    }

    pub fn mask_mouse_side1(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Side1, enabled)
    }

    pub fn mask_mouse_side2(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Side2, enabled)
    }

    pub fn mask_mouse_x(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::X, enabled)
    }

    pub fn mask_mouse_y(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Y, enabled)
    }

    pub fn mask_mouse_wheel(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.mask_mouse(MaskTarget::Wheel, enabled)
    }

    /// Hides one physical key from the host.
    pub fn mask_keyboard(&mut self, key: impl Into<u8>) -> Result<(), DeviceError> {
        let rand = self.masks.keyboard_argument(key.into());
        self.send_command(CommandId::MaskMouse, rand, &[])
    }

    /// Stops hiding one physical key.
    pub fn unmask_keyboard(&mut self, key: impl Into<u8>) -> Result<(), DeviceError> {
        let rand = self.masks.keyboard_argument(key.into());
        self.send_command(CommandId::UnmaskAll, rand, &[])
    }

    /// Drops every mask.
    pub fn unmask_all(&mut self) -> Result<(), DeviceError> {
        self.masks.clear();
        self.send_command(CommandId::UnmaskAll, 0, &[])
    }

    // ── System ───────────────────────────────────────────────────────────────

    /// Reboots the box.  Call [`DeviceSession::handshake`] once it is back.
    pub fn reboot(&mut self) -> Result<(), DeviceError> {
        self.send_command(CommandId::Reboot, random_nonce(), &[])?;
        info!("reboot requested for device {}", self.device());
        Ok(())
    }

    /// Changes the box's IP address and command port.  Takes effect after a
    /// reboot.
    pub fn set_config(&mut self, ip: Ipv4Addr, port: u16) -> Result<(), DeviceError> {
        let rand = u32::from_le_bytes(ip.octets());
        self.send_command(CommandId::SetConfig, rand, &port.to_be_bytes())
    }

    /// Changes the USB vendor and product id the box presents to the host.
    /// Takes effect after a reboot.
    pub fn set_vid_pid(&mut self, vid: u16, pid: u16) -> Result<(), DeviceError> {
        let rand = u32::from(vid) | (u32::from(pid) << 16);
        self.send_command(CommandId::SetVidPid, rand, &[])
    }

    /// Turns the box's hardware curve correction on or off.
    ///
    /// `kind` selects the curve (0 bezier, 1 missile tracking, 2 real-time
    /// bezier, 3 RM-RT).  `value` 0 disables it; larger values are smoother
    /// and slower (16 to 50 works well, 100 is the maximum).  Only the low 24
    /// bits of `value` are sent.
    pub fn trace_enable(&mut self, kind: u8, value: u32) -> Result<(), DeviceError> {
        let rand = (u32::from(kind) << 24) | (value & TRACE_VALUE_MASK);
        self.send_command(CommandId::TraceEnable, rand, &[])
    }

    // ── LCD ──────────────────────────────────────────────────────────────────

    /// Fills the whole screen with one RGB565 colour.
    pub fn lcd_color(&mut self, rgb565: u16) -> Result<(), DeviceError> {
        let band: Vec<u8> = rgb565
            .to_le_bytes()
            .iter()
            .copied()
            .cycle()
            .take(LCD_BAND_BYTES)
            .collect();
        for band_index in 0..LCD_HEIGHT / LCD_BAND_ROWS {
            let rand = (band_index * LCD_BAND_ROWS) as u32;
            self.send_command(CommandId::ShowPicture, rand, &band)?;
        }
        Ok(())
    }

    /// Shows a full-screen 128x160 RGB565 image.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ImageTooShort`] if `image` holds fewer than
    /// 128 * 160 * 2 bytes.
    pub fn lcd_picture(&mut self, image: &[u8]) -> Result<(), DeviceError> {
        self.send_lcd_region("full-screen", image, 0, LCD_HEIGHT)
    }

    /// Shows a 128x80 RGB565 image on the bottom half of the screen.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ImageTooShort`] if `image` holds fewer than
    /// 128 * 80 * 2 bytes.
    pub fn lcd_picture_bottom(&mut self, image: &[u8]) -> Result<(), DeviceError> {
        self.send_lcd_region(
            "bottom",
            image,
            LCD_HEIGHT - LCD_BOTTOM_HEIGHT,
            LCD_BOTTOM_HEIGHT,
        )
    }

    fn send_lcd_region(
        &mut self,
        region: &'static str,
        image: &[u8],
        first_row: usize,
        rows: usize,
    ) -> Result<(), DeviceError> {
        let needed = LCD_WIDTH * rows * 2;
        if image.len() < needed {
            return Err(DeviceError::ImageTooShort {
                region,
                needed,
                available: image.len(),
            });
        }
        for (band_index, band) in image[..needed].chunks(LCD_BAND_BYTES).enumerate() {
            let rand = (first_row + band_index * LCD_BAND_ROWS) as u32;
            self.send_command(CommandId::ShowPicture, rand, band)?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
