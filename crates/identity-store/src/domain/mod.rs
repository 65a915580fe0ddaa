//! # Domain Layer
//!
//! Identity records and credential material with no I/O dependencies.

pub mod entities;
pub mod errors;
pub mod password;
