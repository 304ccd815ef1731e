//! Persistent storage for the kmnet CLI.

pub mod config;
