//! Integration tests for kmnet-core.
//!
//! These tests drive the public API the way the client does: update the soft
//! report state, encode it into a frame, optionally encrypt it, and check the
//! bytes a device would receive.

use kmnet_core::{
    crypto::xxtea_decrypt,
    protocol::{
        decode_header, encode_encrypted_frame, encode_frame, encode_keyboard_report,
        encode_mouse_report, CommandHeader, CommandId, IndexCounter, ENCRYPTED_FRAME_SIZE,
        HEADER_SIZE, MONITOR_ENABLE_MARKER,
    },
    DeviceId, HidKeyCode, KeyboardState, MouseButton, MouseState,
};

fn device() -> DeviceId {
    DeviceId::parse("0B50E466").expect("valid id")
}

#[test]
fn test_shift_h_sequence_produces_expected_keyboard_frames() {
    // Arrange
    let id = device();
    let counter = IndexCounter::new();
    let mut kb = KeyboardState::new();
    let mut frames = Vec::new();

    // Act – Shift down, H down, H up, Shift up
    for (key, down) in [
        (HidKeyCode::ShiftLeft, true),
        (HidKeyCode::KeyH, true),
        (HidKeyCode::KeyH, false),
        (HidKeyCode::ShiftLeft, false),
    ] {
        if down {
            kb.press(key.into());
        } else {
            kb.release(key.into());
        }
        let header = CommandHeader::new(id.raw(), 0, counter.next(), CommandId::KeyboardAll);
        frames.push(encode_frame(&header, &encode_keyboard_report(&kb.report())).unwrap());
    }

    // Assert
    let payloads: Vec<&[u8]> = frames.iter().map(|f| &f[HEADER_SIZE..]).collect();
    assert_eq!(payloads[0][..3], [0x02, 0x00, 0x00]);
    assert_eq!(payloads[1][..3], [0x02, 0x00, 0x0B]);
    assert_eq!(payloads[2][..3], [0x02, 0x00, 0x00]);
    assert_eq!(payloads[3][..3], [0x00, 0x00, 0x00]);

    let indices: Vec<u32> = frames
        .iter()
        .map(|f| decode_header(f).unwrap().indexpts)
        .collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
}

#[test]
fn test_drag_keeps_button_held_across_moves() {
    let mut mouse = MouseState::new();
    mouse.set_button(MouseButton::Left, true);

    mouse.stage_move(100, 100);
    let first = encode_mouse_report(&mouse.report());
    mouse.clear_transient();
    mouse.stage_move(-100, -100);
    let second = encode_mouse_report(&mouse.report());

    assert_eq!(&first[0..4], &[1, 0, 0, 0]);
    assert_eq!(&second[0..4], &[1, 0, 0, 0]);
    assert_eq!(&second[4..8], &(-100i32).to_le_bytes());
}

#[test]
fn test_encrypted_frame_decrypts_with_device_session_key() {
    // Arrange
    let id = device();
    let mut mouse = MouseState::new();
    mouse.stage_move(7, 9);
    let header = CommandHeader::new(id.raw(), 0xDEAD, 3, CommandId::MouseMove);
    let payload = encode_mouse_report(&mouse.report());

    // Act
    let mut frame = encode_encrypted_frame(&header, &payload, &id.session_key()).unwrap();

    // Assert
    assert_eq!(frame.len(), ENCRYPTED_FRAME_SIZE);
    assert_ne!(&frame[..HEADER_SIZE], &encode_frame(&header, &[]).unwrap()[..]);
    xxtea_decrypt(&mut frame, &id.session_key());
    assert_eq!(decode_header(&frame).unwrap(), header);
    assert_eq!(&frame[HEADER_SIZE..HEADER_SIZE + payload.len()], &payload[..]);
}

#[test]
fn test_monitor_enable_argument_layout() {
    let rand = MONITOR_ENABLE_MARKER | 12345;
    let header = CommandHeader::new(device().raw(), rand, 1, CommandId::Monitor);
    let frame = encode_frame(&header, &[]).unwrap();
    assert_eq!(&frame[4..8], &[0x39, 0x30, 0x55, 0xAA]);
}
