//! # Identity Bridge Runtime
//!
//! Library half of the `bridge-runtime` binary: configuration loading and
//! logging initialisation.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Install the tracing subscriber
//! 3. Connect to the broker (fail fast if unreachable)
//! 4. Ensure the request and response topics exist
//! 5. Seed the administrator account, if configured
//! 6. Spawn the listeners and wait for Ctrl+C

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod telemetry;

pub use container::{AdminSeed, ConfigError, LogFormat, RuntimeConfig};
