//! # Bridge Bus - Broker Transport Ports
//!
//! The bridge talks to the broker through two narrow ports:
//!
//! - [`RequestConsumer`]: pulls the next message of a topic on behalf of a
//!   named consumer group. Each message reaches exactly one member of a group.
//! - [`ResponseSink`]: publishes bytes to a topic and resolves only once the
//!   broker acknowledged the write.
//!
//! ```text
//! ┌──────────────┐   next_delivery()   ┌──────────────┐   publish()   ┌──────────────┐
//! │ request topic│ ──────────────────→ │   Listener   │ ────────────→ │response topic│
//! └──────────────┘    (group member)   └──────────────┘   (awaits ack)└──────────────┘
//! ```
//!
//! ## Adapters
//!
//! - [`InMemoryBroker`]: append-only topic logs with group cursors and commit
//!   offsets. Used by tests and local runs; supports crash simulation.
//! - [`JetStreamBroker`]: NATS JetStream, with durable pull consumers acting
//!   as consumer groups and publish acknowledgments as the flush barrier.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod errors;
pub mod memory;
pub mod nats;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use errors::BusError;
pub use memory::{InMemoryBroker, InMemoryConsumer};
pub use nats::{JetStreamBroker, JetStreamConsumer};
pub use publisher::{PublishAck, ResponseSink};
pub use subscriber::{CommitHandle, Delivery, RequestConsumer};
