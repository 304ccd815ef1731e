//! Device identity.
//!
//! Each box shows an eight-digit hexadecimal UUID on its screen (for example
//! `0B50E466`).  That value goes into the `mac` field of every command header
//! and also seeds the session key for encrypted frames.
//!
//! Users copy the UUID by hand, so the parser is forgiving about separators
//! and letter case but strict about everything else: a typo is reported
//! instead of silently producing an identity the box will ignore.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::SessionKey;

/// Errors that can occur when parsing a device UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceIdError {
    /// Nothing left after removing separators.
    #[error("device id is empty")]
    Empty,

    /// More than eight hex digits.
    #[error("device id {0:?} has more than 8 hex digits")]
    TooLong(String),

    /// A character that is neither a hex digit nor a separator.
    #[error("device id {input:?} contains invalid character {found:?}")]
    InvalidCharacter { input: String, found: char },
}

/// The 32-bit identity of one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wraps a raw identity value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Parses the UUID shown on the device screen.
    ///
    /// Accepts `0B50E466`, `0b50e466`, `0B:50:E4:66` and `0B-50-E4-66`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceIdError`] for empty, over-long or non-hex input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kmnet_core::domain::DeviceId;
    ///
    /// let id = DeviceId::parse("0B-50-E4-66").unwrap();
    /// assert_eq!(id.raw(), 0x0B50_E466);
    /// ```
    pub fn parse(input: &str) -> Result<Self, DeviceIdError> {
        let digits: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != ':')
            .collect();

        if digits.is_empty() {
            return Err(DeviceIdError::Empty);
        }
        if let Some(found) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DeviceIdError::InvalidCharacter {
                input: input.to_string(),
                found,
            });
        }
        if digits.len() > 8 {
            return Err(DeviceIdError::TooLong(input.to_string()));
        }

        let raw = u32::from_str_radix(&digits, 16)
            .map_err(|_| DeviceIdError::TooLong(input.to_string()))?;
        Ok(Self(raw))
    }

    /// Value placed in the `mac` header field.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Key used for encrypted frames sent to this device.
    pub fn session_key(self) -> SessionKey {
        SessionKey::from_mac(self.0)
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}
