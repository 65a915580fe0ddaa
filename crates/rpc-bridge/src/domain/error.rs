//! Bridge error types.
//!
//! Business outcomes (400/401/403/404) are never errors: handlers return them
//! as ordinary [`ResponseEnvelope`](bridge_types::ResponseEnvelope) values.
//! [`HandlerFault`] is reserved for the unexpected and always maps to 500.

use bridge_bus::BusError;
use bridge_types::EnvelopeError;
use identity_store::StoreError;
use thiserror::Error;

/// Unexpected condition inside a handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerFault {
    /// The Identity Store failed in a way the handler does not answer for.
    #[error("identity store failure: {0}")]
    Store(#[from] StoreError),

    /// A result body could not be serialized.
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Errors raised by the bridge plumbing around the handlers.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Every publish attempt for one response failed.
    #[error("publish failed after {attempts} attempt(s): {last}")]
    PublishExhausted { attempts: u32, last: BusError },

    #[error("invalid bridge configuration: {0}")]
    InvalidConfig(String),
}
