//! # RPC Bridge
//!
//! Turns a fire-and-forget publish/subscribe transport into a
//! request/response API for the identity actions.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                           RPC BRIDGE                                  │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │  request topic                                                        │
//! │       │  (consumer group member)                                      │
//! │  ┌────┴────────────┐   ┌──────────────┐   ┌─────────────────┐         │
//! │  │ InboundListener │ → │  Dispatcher  │ → │ ActionRegistry  │         │
//! │  │  (sequential)   │   │ (failure     │   │ tag → handler   │         │
//! │  └────┬────────────┘   │  boundary,   │   └────────┬────────┘         │
//! │       │                │  re-stamp)   │            │                  │
//! │       │                └──────────────┘     IdentityStore             │
//! │  ┌────┴──────────────┐                                                │
//! │  │ OutboundPublisher │ → response topic (awaits ack before next pull) │
//! │  └───────────────────┘                                                │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - Exactly one response per decoded or undecodable request.
//! - The response `correlationId` is the request's, byte for byte, whatever
//!   the handler returned; `null` when none could be recovered.
//! - Per listener, responses are published in request order.
//! - A handler fault, panic or missed deadline becomes a 500; the listener
//!   loop never dies because of a request.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![deny(unsafe_code)]

pub mod dispatcher;
pub mod domain;
pub mod handlers;
pub mod listener;
pub mod publisher;
pub mod registry;
pub mod service;

// Re-export public API
pub use dispatcher::Dispatcher;
pub use domain::action::ActionKind;
pub use domain::config::{BridgeConfig, CommitPolicy, FaultDetail, RetryPolicy};
pub use domain::error::{BridgeError, HandlerFault};
pub use listener::{InboundListener, ListenerStats};
pub use publisher::OutboundPublisher;
pub use registry::{ActionRegistry, Handler, RegistryBuilder};
pub use service::BridgeService;
