//! Command index counter for the `indexpts` header field.
//!
//! # How the box uses the index
//!
//! The handshake always carries index 0.  Every command after it carries the
//! next index, starting at 1, so the box can tell a fresh command from a
//! retransmitted duplicate.  The counter lives for one session and is reset
//! whenever the client reconnects.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU32` internally so a session can be shared behind
//! an `Arc` without a lock around the index.

use std::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe, wrapping counter for command indices.
///
/// # Examples
///
/// ```rust
/// use kmnet_core::protocol::IndexCounter;
///
/// let counter = IndexCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct IndexCounter {
    inner: AtomicU32,
}

impl IndexCounter {
    /// Creates a counter whose first [`next`](Self::next) returns 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU32::new(0),
        }
    }

    /// Advances the counter and returns the new index.
    ///
    /// Wraps from `u32::MAX` to 0 without panicking.
    pub fn next(&self) -> u32 {
        // `fetch_add` returns the old value and wraps on overflow.
        self.inner.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the index of the last command sent.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Resets to the handshake index (0).
    pub fn reset(&self) {
        self.inner.store(0, Ordering::Relaxed);
    }
}

impl Default for IndexCounter {
    fn default() -> Self {
        Self::new()
    }
}
