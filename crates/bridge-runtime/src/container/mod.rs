//! # Runtime Container
//!
//! Configuration and start-up wiring for the bridge process.

pub mod config;

pub use config::{AdminSeed, ConfigError, LogFormat, RuntimeConfig};
