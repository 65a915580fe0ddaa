//! # Identity Bridge Test Suite
//!
//! Unified test crate running the bridge against the in-memory broker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs             # Broker + store + service fixture
//!     ├── e2e_bridge.rs          # Action flows over the bus
//!     └── delivery_semantics.rs  # Ordering, commits, retries, faults
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::delivery_semantics::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
