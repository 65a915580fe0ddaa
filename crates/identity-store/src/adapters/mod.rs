//! # Adapters Layer
//!
//! Concrete [`IdentityStore`](crate::IdentityStore) implementations.

pub mod memory;
