//! Binary codec for command frames, acknowledgements and monitor packets.
//!
//! Command frame:
//! ```text
//! [mac:4][rand:4][indexpts:4][cmd:4][payload:N]
//! ```
//! Header size: 16 bytes. All integers are little-endian.
//!
//! Encrypted frames are the same bytes copied into a zeroed 128-byte block
//! and run through [`xxtea_encrypt`]; the whole block is sent.
//!
//! Monitor packet (box -> client):
//! ```text
//! [report_id:1][buttons:1][x:2][y:2][wheel:2]   pointer, 8 bytes
//! [report_id:1][buttons:1][keys:10]             keyboard, 12 bytes
//! ```

use crate::crypto::{xxtea_encrypt, SessionKey};
use crate::protocol::messages::{
    CommandHeader, HardKeyboard, HardMouse, SoftKeyboardReport, SoftMouseReport,
    ENCRYPTED_FRAME_SIZE, HEADER_SIZE, KEY_SLOTS, MAX_PAYLOAD_SIZE, MONITOR_PACKET_SIZE,
};
use thiserror::Error;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command id is not one the firmware defines.
    #[error("unknown command id: 0x{0:08X}")]
    UnknownCommand(u32),

    /// The payload does not fit into a single frame.
    #[error("payload too large: {len} bytes, limit is {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

// ── Header ────────────────────────────────────────────────────────────────────

/// Appends the 16-byte header to `buf`.
pub fn encode_header(buf: &mut Vec<u8>, header: &CommandHeader) {
    buf.extend_from_slice(&header.mac.to_le_bytes());
    buf.extend_from_slice(&header.rand.to_le_bytes());
    buf.extend_from_slice(&header.indexpts.to_le_bytes());
    buf.extend_from_slice(&header.cmd.to_le_bytes());
}

/// Reads a header from the beginning of `bytes`.
///
/// The command id is returned raw; use [`CommandHeader::command`] to type it.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if fewer than 16 bytes are given.
pub fn decode_header(bytes: &[u8]) -> Result<CommandHeader, ProtocolError> {
    require_len(bytes, HEADER_SIZE)?;
    Ok(CommandHeader {
        mac: read_u32(bytes, 0),
        rand: read_u32(bytes, 4),
        indexpts: read_u32(bytes, 8),
        cmd: read_u32(bytes, 12),
    })
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// Encodes a clear-text frame: header followed by `payload`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if `payload` exceeds 1024 bytes.
///
/// # Examples
///
/// ```rust
/// use kmnet_core::protocol::{encode_frame, CommandHeader, CommandId};
///
/// let header = CommandHeader::new(0x0B50_E466, 0, 1, CommandId::Reboot);
/// let frame = encode_frame(&header, &[]).unwrap();
/// assert_eq!(frame.len(), 16);
/// ```
pub fn encode_frame(header: &CommandHeader, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    encode_header(&mut buf, header);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Encodes an encrypted frame: header and `payload` zero-padded to 128
/// bytes, then encrypted with `key`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if header and payload together
/// exceed 128 bytes.
pub fn encode_encrypted_frame(
    header: &CommandHeader,
    payload: &[u8],
    key: &SessionKey,
) -> Result<Vec<u8>, ProtocolError> {
    let max = ENCRYPTED_FRAME_SIZE - HEADER_SIZE;
    if payload.len() > max {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max,
        });
    }
    let mut buf = Vec::with_capacity(ENCRYPTED_FRAME_SIZE);
    encode_header(&mut buf, header);
    buf.extend_from_slice(payload);
    buf.resize(ENCRYPTED_FRAME_SIZE, 0);
    xxtea_encrypt(&mut buf, key);
    Ok(buf)
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Serialises a pointer report into its 56-byte wire form.
pub fn encode_mouse_report(report: &SoftMouseReport) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SoftMouseReport::SIZE);
    buf.extend_from_slice(&report.button.to_le_bytes());
    buf.extend_from_slice(&report.x.to_le_bytes());
    buf.extend_from_slice(&report.y.to_le_bytes());
    buf.extend_from_slice(&report.wheel.to_le_bytes());
    for p in &report.point {
        buf.extend_from_slice(&p.to_le_bytes());
    }
    buf
}

/// Serialises a keyboard report into its 12-byte wire form.
pub fn encode_keyboard_report(report: &SoftKeyboardReport) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SoftKeyboardReport::SIZE);
    buf.push(report.ctrl);
    buf.push(report.reserved);
    buf.extend_from_slice(&report.button);
    buf
}

/// Parses a pointer report from its wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] on short input.
pub fn decode_mouse_report(bytes: &[u8]) -> Result<SoftMouseReport, ProtocolError> {
    require_len(bytes, SoftMouseReport::SIZE)?;
    let mut point = [0i32; 10];
    for (i, p) in point.iter_mut().enumerate() {
        *p = read_u32(bytes, 16 + i * 4) as i32;
    }
    Ok(SoftMouseReport {
        button: read_u32(bytes, 0) as i32,
        x: read_u32(bytes, 4) as i32,
        y: read_u32(bytes, 8) as i32,
        wheel: read_u32(bytes, 12) as i32,
        point,
    })
}

/// Parses a keyboard report from its wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] on short input.
pub fn decode_keyboard_report(bytes: &[u8]) -> Result<SoftKeyboardReport, ProtocolError> {
    require_len(bytes, SoftKeyboardReport::SIZE)?;
    let mut button = [0u8; KEY_SLOTS];
    button.copy_from_slice(&bytes[2..2 + KEY_SLOTS]);
    Ok(SoftKeyboardReport {
        ctrl: bytes[0],
        reserved: bytes[1],
        button,
    })
}

// ── Monitor packets ───────────────────────────────────────────────────────────

/// Decodes one datagram received on the monitor channel.
///
/// Bytes beyond the first 20 are ignored.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] for datagrams shorter than
/// 20 bytes.
pub fn decode_monitor_packet(bytes: &[u8]) -> Result<(HardMouse, HardKeyboard), ProtocolError> {
    require_len(bytes, MONITOR_PACKET_SIZE)?;

    let mouse = HardMouse {
        report_id: bytes[0],
        buttons: bytes[1],
        x: i16::from_le_bytes([bytes[2], bytes[3]]),
        y: i16::from_le_bytes([bytes[4], bytes[5]]),
        wheel: i16::from_le_bytes([bytes[6], bytes[7]]),
    };

    let kb = &bytes[8..MONITOR_PACKET_SIZE];
    let mut keys = [0u8; KEY_SLOTS];
    keys.copy_from_slice(&kb[2..2 + KEY_SLOTS]);
    let keyboard = HardKeyboard {
        report_id: kb[0],
        buttons: kb[1],
        keys,
    };

    Ok((mouse, keyboard))
}

/// Encodes a monitor datagram.  The box produces these; simulators and
/// tests use this to feed a monitor.
pub fn encode_monitor_packet(mouse: &HardMouse, keyboard: &HardKeyboard) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MONITOR_PACKET_SIZE);
    buf.push(mouse.report_id);
    buf.push(mouse.buttons);
    buf.extend_from_slice(&mouse.x.to_le_bytes());
    buf.extend_from_slice(&mouse.y.to_le_bytes());
    buf.extend_from_slice(&mouse.wheel.to_le_bytes());
    buf.push(keyboard.report_id);
    buf.push(keyboard.buttons);
    buf.extend_from_slice(&keyboard.keys);
    buf
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Reads a little-endian u32.  Callers check the length first.
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::xxtea_decrypt;
    use crate::protocol::messages::CommandId;

    // ── Header ───────────────────────────────────────────────────────────────

    #[test]
    fn test_header_fields_are_little_endian_in_order() {
        // Arrange
        let header = CommandHeader::new(0x0B50_E466, 0x1122_3344, 7, CommandId::MouseMove);

        // Act
        let frame = encode_frame(&header, &[]).unwrap();

        // Assert
        assert_eq!(&frame[0..4], &[0x66, 0xE4, 0x50, 0x0B]);
        assert_eq!(&frame[4..8], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(&frame[8..12], &[7, 0, 0, 0]);
        assert_eq!(&frame[12..16], &0xaede_7345u32.to_le_bytes());
    }

    #[test]
    fn test_decode_header_reads_back_encoded_header() {
        let header = CommandHeader::new(0xCAFE_BABE, 42, 9, CommandId::Monitor);
        let frame = encode_frame(&header, &[1, 2, 3]).unwrap();
        let decoded = decode_header(&frame).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.command(), Some(CommandId::Monitor));
    }

    #[test]
    fn test_decode_header_short_input_returns_insufficient_data() {
        let result = decode_header(&[0u8; 15]);
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData {
                needed: 16,
                available: 15
            })
        );
    }

    // ── Frames ───────────────────────────────────────────────────────────────

    #[test]
    fn test_frame_appends_payload_after_header() {
        let header = CommandHeader::new(1, 2, 3, CommandId::SetConfig);
        let frame = encode_frame(&header, &[0x22, 0xB8]).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + 2);
        assert_eq!(&frame[16..], &[0x22, 0xB8]);
    }

    #[test]
    fn test_frame_with_full_lcd_row_is_accepted() {
        let header = CommandHeader::new(1, 0, 1, CommandId::ShowPicture);
        let frame = encode_frame(&header, &[0u8; MAX_PAYLOAD_SIZE]).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_frame_with_oversized_payload_is_rejected() {
        let header = CommandHeader::new(1, 0, 1, CommandId::ShowPicture);
        let result = encode_frame(&header, &[0u8; MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_encrypted_frame_is_always_128_bytes_and_decrypts_to_plain_frame() {
        // Arrange
        let key = SessionKey::from_mac(0x0B50_E466);
        let header = CommandHeader::new(0x0B50_E466, 0xABCD, 5, CommandId::MouseMove);
        let payload = encode_mouse_report(&SoftMouseReport {
            x: 100,
            y: -100,
            ..Default::default()
        });

        // Act
        let mut frame = encode_encrypted_frame(&header, &payload, &key).unwrap();

        // Assert
        assert_eq!(frame.len(), ENCRYPTED_FRAME_SIZE);
        xxtea_decrypt(&mut frame, &key);
        assert_eq!(decode_header(&frame).unwrap(), header);
        let report = decode_mouse_report(&frame[HEADER_SIZE..]).unwrap();
        assert_eq!((report.x, report.y), (100, -100));
        assert!(frame[HEADER_SIZE + SoftMouseReport::SIZE..]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_encrypted_frame_rejects_payload_beyond_block() {
        let key = SessionKey::from_mac(1);
        let header = CommandHeader::new(1, 0, 1, CommandId::MouseMove);
        let result = encode_encrypted_frame(&header, &[0u8; 113], &key);
        assert_eq!(
            result,
            Err(ProtocolError::PayloadTooLarge { len: 113, max: 112 })
        );
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_report_layout() {
        let mut report = SoftMouseReport {
            button: 0x01,
            x: -1,
            y: 2,
            wheel: 3,
            ..Default::default()
        };
        report.point[3] = 9;

        let bytes = encode_mouse_report(&report);

        assert_eq!(bytes.len(), 56);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[28..32], &[9, 0, 0, 0]);
        assert_eq!(decode_mouse_report(&bytes).unwrap(), report);
    }

    #[test]
    fn test_keyboard_report_layout() {
        let report = SoftKeyboardReport {
            ctrl: 0x02,
            reserved: 0,
            button: [0x0B, 0x08, 0, 0, 0, 0, 0, 0, 0, 0],
        };

        let bytes = encode_keyboard_report(&report);

        assert_eq!(bytes, vec![0x02, 0x00, 0x0B, 0x08, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode_keyboard_report(&bytes).unwrap(), report);
    }

    // ── Monitor packets ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_monitor_packet_extracts_both_reports() {
        // Arrange
        let mut packet = vec![0u8; 20];
        packet[0] = 0x01;
        packet[1] = 0x03; // left + right
        packet[2..4].copy_from_slice(&(-5i16).to_le_bytes());
        packet[4..6].copy_from_slice(&12i16.to_le_bytes());
        packet[6..8].copy_from_slice(&(-1i16).to_le_bytes());
        packet[8] = 0x02;
        packet[9] = 0x02; // left shift
        packet[10] = 0x0B; // H

        // Act
        let (mouse, keyboard) = decode_monitor_packet(&packet).unwrap();

        // Assert
        assert_eq!(mouse.buttons, 0x03);
        assert_eq!((mouse.x, mouse.y, mouse.wheel), (-5, 12, -1));
        assert_eq!(keyboard.buttons, 0x02);
        assert_eq!(keyboard.pressed_keys().collect::<Vec<_>>(), vec![0x0B]);
    }

    #[test]
    fn test_decode_monitor_packet_ignores_trailing_bytes() {
        let mut packet = vec![0u8; 64];
        packet[1] = 0x04;
        let (mouse, _) = decode_monitor_packet(&packet).unwrap();
        assert_eq!(mouse.buttons, 0x04);
    }

    #[test]
    fn test_decode_monitor_packet_rejects_short_datagram() {
        let result = decode_monitor_packet(&[0u8; 19]);
        assert!(matches!(
            result,
            Err(ProtocolError::InsufficientData { needed: 20, .. })
        ));
    }

    #[test]
    fn test_encode_monitor_packet_matches_decoder() {
        let mouse = HardMouse {
            report_id: 1,
            buttons: 0x10,
            x: 300,
            y: -300,
            wheel: 1,
        };
        let keyboard = HardKeyboard {
            report_id: 2,
            buttons: 0x80,
            keys: [4, 5, 6, 0, 0, 0, 0, 0, 0, 0],
        };
        let packet = encode_monitor_packet(&mouse, &keyboard);
        assert_eq!(packet.len(), MONITOR_PACKET_SIZE);
        assert_eq!(decode_monitor_packet(&packet).unwrap(), (mouse, keyboard));
    }
}
