//! XXTEA block cipher over a fixed 32-word block.
//!
//! The firmware runs six rounds over exactly 128 bytes, which is fewer than
//! the `6 + 52 / n` rounds of reference XXTEA.  Both directions here use the
//! firmware's round count, so they interoperate with the box but not with
//! general-purpose XXTEA libraries.

use crate::protocol::messages::ENCRYPTED_FRAME_SIZE;

const DELTA: u32 = 0x9E37_79B9;
const WORDS: usize = ENCRYPTED_FRAME_SIZE / 4;
const ROUNDS: u32 = 6;

/// 128-bit key derived from the device identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionKey(pub [u8; 16]);

impl SessionKey {
    /// Derives the key the box expects: the device `mac` in big-endian byte
    /// order followed by twelve zero bytes.
    pub fn from_mac(mac: u32) -> Self {
        let mut key = [0u8; 16];
        key[..4].copy_from_slice(&mac.to_be_bytes());
        Self(key)
    }

    fn words(&self) -> [u32; 4] {
        let mut k = [0u32; 4];
        for (word, chunk) in k.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        k
    }
}

/// Encrypts the first 128 bytes of `block` in place.
///
/// Blocks shorter than 128 bytes are left untouched.
pub fn xxtea_encrypt(block: &mut [u8], key: &SessionKey) {
    let Some(mut v) = load_words(block) else {
        return;
    };
    let k = key.words();

    let mut sum: u32 = 0;
    let mut z = v[WORDS - 1];
    for _ in 0..ROUNDS {
        sum = sum.wrapping_add(DELTA);
        let e = (sum >> 2) & 3;
        for p in 0..WORDS {
            let y = v[(p + 1) % WORDS];
            v[p] = v[p].wrapping_add(mx(sum, y, z, p, e, &k));
            z = v[p];
        }
    }

    store_words(block, &v);
}

/// Decrypts the first 128 bytes of `block` in place.
///
/// Exact inverse of [`xxtea_encrypt`].  The client never needs it; device
/// simulators and tests do.
pub fn xxtea_decrypt(block: &mut [u8], key: &SessionKey) {
    let Some(mut v) = load_words(block) else {
        return;
    };
    let k = key.words();

    let mut sum = DELTA.wrapping_mul(ROUNDS);
    let mut y = v[0];
    for _ in 0..ROUNDS {
        let e = (sum >> 2) & 3;
        for p in (0..WORDS).rev() {
            let z = v[(p + WORDS - 1) % WORDS];
            v[p] = v[p].wrapping_sub(mx(sum, y, z, p, e, &k));
            y = v[p];
        }
        sum = sum.wrapping_sub(DELTA);
    }

    store_words(block, &v);
}

#[inline]
fn mx(sum: u32, y: u32, z: u32, p: usize, e: u32, k: &[u32; 4]) -> u32 {
    let left = ((z >> 5) ^ (y << 2)).wrapping_add((y >> 3) ^ (z << 4));
    let right = (sum ^ y).wrapping_add(k[(p & 3) ^ e as usize] ^ z);
    left ^ right
}

fn load_words(block: &[u8]) -> Option<[u32; WORDS]> {
    if block.len() < ENCRYPTED_FRAME_SIZE {
        return None;
    }
    let mut v = [0u32; WORDS];
    for (word, chunk) in v.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(v)
}

fn store_words(block: &mut [u8], v: &[u32; WORDS]) {
    for (chunk, word) in block.chunks_exact_mut(4).zip(v.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> [u8; ENCRYPTED_FRAME_SIZE] {
        let mut block = [0u8; ENCRYPTED_FRAME_SIZE];
        for (i, b) in block.iter_mut().enumerate() {
            *b = (i * 7 + 3) as u8;
        }
        block
    }

    #[test]
    fn test_session_key_places_mac_big_endian_in_first_four_bytes() {
        let key = SessionKey::from_mac(0x0B50_E466);
        assert_eq!(&key.0[..4], &[0x0B, 0x50, 0xE4, 0x66]);
        assert!(key.0[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encrypt_changes_block() {
        // Arrange
        let key = SessionKey::from_mac(0x0B50_E466);
        let original = sample_block();
        let mut block = original;

        // Act
        xxtea_encrypt(&mut block, &key);

        // Assert
        assert_ne!(block, original);
    }

    #[test]
    fn test_decrypt_inverts_encrypt() {
        // Arrange
        let key = SessionKey::from_mac(0x1234_5678);
        let original = sample_block();
        let mut block = original;

        // Act
        xxtea_encrypt(&mut block, &key);
        xxtea_decrypt(&mut block, &key);

        // Assert
        assert_eq!(block, original);
    }

    #[test]
    fn test_decrypt_with_wrong_key_does_not_recover_plaintext() {
        let original = sample_block();
        let mut block = original;
        xxtea_encrypt(&mut block, &SessionKey::from_mac(1));
        xxtea_decrypt(&mut block, &SessionKey::from_mac(2));
        assert_ne!(block, original);
    }

    #[test]
    fn test_short_block_is_left_untouched() {
        let mut short = [0xAAu8; 64];
        xxtea_encrypt(&mut short, &SessionKey::from_mac(0x0B50_E466));
        assert!(short.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_only_first_128_bytes_are_touched() {
        let mut long = [0x55u8; 160];
        xxtea_encrypt(&mut long, &SessionKey::from_mac(7));
        assert!(long[128..].iter().all(|&b| b == 0x55));
    }

    #[test]
    fn test_same_plaintext_with_different_nonce_encrypts_differently() {
        // The nonce lives in bytes 4..8 (the `rand` header field).
        let key = SessionKey::from_mac(0x0B50_E466);
        let mut a = [0u8; ENCRYPTED_FRAME_SIZE];
        let mut b = [0u8; ENCRYPTED_FRAME_SIZE];
        a[4] = 1;
        b[4] = 2;

        xxtea_encrypt(&mut a, &key);
        xxtea_encrypt(&mut b, &key);

        assert_ne!(a, b);
    }
}
