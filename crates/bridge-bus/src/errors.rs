use thiserror::Error;

/// Errors from broker operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker endpoint could not be reached.
    #[error("broker connection failed: {0}")]
    Connect(String),

    /// Topic (stream) setup failed.
    #[error("topic setup failed: {0}")]
    Topic(String),

    /// Pulling the next message failed.
    #[error("receive failed: {0}")]
    Receive(String),

    /// The broker rejected or did not acknowledge a write.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Advancing the group offset failed.
    #[error("commit failed: {0}")]
    Commit(String),

    /// The broker was shut down.
    #[error("broker closed")]
    Closed,
}
