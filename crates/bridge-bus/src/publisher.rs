//! # Response Sink
//!
//! Defines the publishing side of the bus.

use crate::errors::BusError;
use async_trait::async_trait;

/// Broker confirmation of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    pub topic: String,
    /// Position assigned to the message in its topic.
    pub sequence: u64,
}

/// Trait for publishing to the bus.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Publish `payload` to `topic`.
    ///
    /// Resolves only after the broker acknowledged the write; callers use this
    /// as their flush barrier.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<PublishAck, BusError>;
}
