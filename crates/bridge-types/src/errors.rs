//! # Error Types
//!
//! Errors raised while moving envelopes on and off the wire.

use crate::correlation::CorrelationId;
use thiserror::Error;

/// Errors related to envelope encoding and decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The bytes are not valid JSON (or not valid UTF-8).
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// Valid JSON, but the top-level value is not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// Serialization of an outbound envelope failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// A request that could not be decoded, with whatever correlation id could
/// be salvaged from the raw bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct DecodeFailure {
    pub error: EnvelopeError,
    pub salvaged: Option<CorrelationId>,
}

/// Status code outside the fixed vocabulary.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unknown status code: {0}")]
pub struct UnknownStatus(pub u16);
