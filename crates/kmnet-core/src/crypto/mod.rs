//! Frame cipher used by the encrypted command variants.
//!
//! The box accepts any pointer or keyboard command either in clear text or
//! as a 128-byte XXTEA-encrypted block.  Because the header carries a fresh
//! random nonce, two encrypted frames for the same movement never look the
//! same on the wire.

pub mod xxtea;

pub use xxtea::{xxtea_decrypt, xxtea_encrypt, SessionKey};
