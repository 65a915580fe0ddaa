//! # Store Errors

use thiserror::Error;

/// Errors returned by [`IdentityStore`](crate::IdentityStore) operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No user with the given id.
    #[error("user {0} not found")]
    NotFound(u64),

    /// Another user already holds this username.
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Another user already holds this email.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// The backing store cannot serve requests.
    #[error("identity store unavailable")]
    Unavailable,
}

impl StoreError {
    /// True for uniqueness violations, which callers report as validation
    /// errors rather than faults.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateUsername(_) | StoreError::DuplicateEmail(_)
        )
    }
}
