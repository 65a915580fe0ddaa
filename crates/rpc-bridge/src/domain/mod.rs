//! # Domain Layer
//!
//! Action tags, bridge configuration and error types.

pub mod action;
pub mod config;
pub mod error;
