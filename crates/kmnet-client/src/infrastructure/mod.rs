//! Infrastructure layer for the kmnet client.
//!
//! Contains the OS-facing adapters: sockets, threads and files.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `kmnet_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – `UdpTransport`, the blocking UDP implementation of
//!   `DeviceTransport`.
//!
//! - **`monitor`** – `EventMonitor`, a background thread that receives the
//!   box's physical-input stream.
//!
//! - **`storage`** – TOML configuration file in the platform config
//!   directory.

pub mod monitor;
pub mod network;
pub mod storage;
