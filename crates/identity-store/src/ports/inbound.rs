//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{CredentialToken, NewUser, UserId, UserPatch, UserRecord};
use crate::domain::errors::StoreError;

/// Primary Identity Store API.
///
/// Synchronous by contract; async callers run it on a blocking thread.
/// Implementations must be thread-safe (`Send + Sync`) and enforce username
/// and email uniqueness atomically.
pub trait IdentityStore: Send + Sync {
    // =========================================================================
    // Credentials
    // =========================================================================

    /// Verify `password` for `username`.
    ///
    /// Returns the account whether or not it is active; callers decide what
    /// an inactive account may do. `Ok(None)` means unknown user or wrong
    /// password.
    fn authenticate(&self, username: &str, password: &str)
        -> Result<Option<UserRecord>, StoreError>;

    /// The standing token of `user`, created on first request.
    fn issue_token(&self, user: UserId) -> Result<CredentialToken, StoreError>;

    /// Replace the password of `user`.
    fn set_password(&self, user: UserId, password: &str) -> Result<(), StoreError>;

    // =========================================================================
    // Lookup
    // =========================================================================

    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    fn find_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;

    fn username_taken(&self, username: &str) -> Result<bool, StoreError>;

    fn email_taken(&self, email: &str) -> Result<bool, StoreError>;

    /// Snapshot of every account, ordered by id.
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    /// - `DuplicateUsername` / `DuplicateEmail` when either is taken; nothing
    ///   is written in that case.
    fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Apply `patch` to account `id` and return the updated record.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `DuplicateUsername` / `DuplicateEmail` when the patch would collide
    ///   with another account; the record is left unmodified.
    fn update_user(&self, id: UserId, patch: UserPatch) -> Result<UserRecord, StoreError>;
}
