//! # Identity Store
//!
//! Owns user records and credential tokens for the bridge.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): user records, patches, tokens, password digests
//! - **Ports Layer** (`ports/`): the synchronous [`IdentityStore`] interface
//! - **Adapters Layer** (`adapters/`): [`InMemoryIdentityStore`]
//!
//! ## Concurrency
//!
//! Several listener instances may call the store at once. Implementations
//! serialize conflicting writes themselves: uniqueness of username and email
//! is checked and enforced under one write lock.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-export public API
pub use adapters::memory::InMemoryIdentityStore;
pub use domain::entities::{CredentialToken, NewUser, UserId, UserPatch, UserRecord};
pub use domain::errors::StoreError;
pub use domain::password::PasswordDigest;
pub use ports::inbound::IdentityStore;
