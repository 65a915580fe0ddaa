//! # Bridge Types Crate
//!
//! Everything that crosses the broker is defined here: the request and
//! response envelopes, the status vocabulary, correlation ids and the user
//! views returned by the identity actions.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every crate serializes through these types.
//! - **Correlation Echo**: a `ResponseEnvelope` always carries the caller's
//!   `correlationId` (or `null` when it could not be recovered).
//! - **Lenient Decoding**: a request is read field by field so that a missing
//!   or malformed `type` never prevents the correlation id from being echoed.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod correlation;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod status;

pub use correlation::CorrelationId;
pub use entities::{Role, UserSummary, UserView};
pub use envelope::{Payload, RequestEnvelope, ResponseEnvelope};
pub use errors::{DecodeFailure, EnvelopeError, UnknownStatus};
pub use status::Status;
