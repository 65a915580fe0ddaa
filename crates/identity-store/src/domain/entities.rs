//! # Identity Entities
//!
//! - `UserRecord`: a stored account, including its password digest.
//! - `NewUser`: input for account creation.
//! - `UserPatch`: merge-patch over an account; `None` fields are untouched.
//! - `CredentialToken`: the standing bearer token of an account.

use crate::domain::password::PasswordDigest;
use bridge_types::{Role, UserSummary, UserView};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::fmt;

/// Numeric account id, assigned sequentially from 1.
pub type UserId = u64;

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub password: PasswordDigest,
}

impl UserRecord {
    /// Full serialized view.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            is_active: self.is_active,
            date_joined: self.date_joined,
        }
    }

    /// Listing projection.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.first_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Apply every present field of `patch`.
    pub(crate) fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(password) = patch.password {
            self.password = PasswordDigest::new(&password);
        }
    }
}

/// Input for account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl NewUser {
    /// A customer account with empty names.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::default(),
        }
    }

    #[must_use]
    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Partial update of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Plain password; digested by the store.
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }
}

/// Standing credential token: 40 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialToken(String);

impl CredentialToken {
    const BYTES: usize = 20;

    pub fn generate() -> Self {
        let mut raw = [0u8; Self::BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        Self(hex::encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CredentialToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CredentialToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are credentials; only a prefix is ever printed in debug output.
impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.0.chars().take(6).collect();
        write!(f, "CredentialToken({shown}..)")
    }
}
