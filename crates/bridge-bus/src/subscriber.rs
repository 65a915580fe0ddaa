//! # Request Consumer
//!
//! Defines the consuming side of the bus.

use crate::errors::BusError;
use async_trait::async_trait;
use std::fmt;

/// Advances a consumer group past one message.
///
/// Consumed on use: a delivery can be committed at most once.
#[async_trait]
pub trait CommitHandle: Send {
    async fn commit(self: Box<Self>) -> Result<(), BusError>;
}

/// A message handed to one member of a consumer group.
pub struct Delivery {
    payload: Vec<u8>,
    sequence: u64,
    commit: Option<Box<dyn CommitHandle>>,
}

impl Delivery {
    pub fn new(payload: Vec<u8>, sequence: u64, commit: Box<dyn CommitHandle>) -> Self {
        Self {
            payload,
            sequence,
            commit: Some(commit),
        }
    }

    /// Raw message bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Broker-assigned position of the message in its topic.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Commit the group offset for this message.
    ///
    /// Subsequent calls are no-ops.
    pub async fn commit(&mut self) -> Result<(), BusError> {
        match self.commit.take() {
            Some(handle) => handle.commit().await,
            None => Ok(()),
        }
    }

    pub fn is_committed(&self) -> bool {
        self.commit.is_none()
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("sequence", &self.sequence)
            .field("bytes", &self.payload.len())
            .field("committed", &self.is_committed())
            .finish()
    }
}

/// Pulls messages for one member of a consumer group.
#[async_trait]
pub trait RequestConsumer: Send {
    /// Wait for the next message.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(delivery))` - the next message for this member
    /// - `Ok(None)` - the broker closed; no more messages will arrive
    /// - `Err(_)` - a transient receive failure
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BusError>;
}
