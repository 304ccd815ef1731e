//! Protocol module containing command definitions and the binary codec.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{
    decode_header, decode_monitor_packet, encode_encrypted_frame, encode_frame,
    encode_keyboard_report, encode_monitor_packet, encode_mouse_report, ProtocolError,
};
pub use messages::*;
pub use sequence::IndexCounter;
