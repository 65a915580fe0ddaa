//! # User Views
//!
//! Serialized projections of identity records returned by the actions.
//!
//! - `UserView`: full profile returned by login, register and profile actions.
//! - `UserSummary`: restricted projection used by user listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. The set is closed so authorization checks stay exhaustive.
///
/// Wire spellings follow the deployed consumers (`ADMIN`, `GESTOR`,
/// `CLIENTE`); English spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN", alias = "ADMINISTRATOR")]
    Administrator,
    #[serde(rename = "GESTOR", alias = "MANAGER")]
    Manager,
    /// Role assigned on self-registration.
    #[default]
    #[serde(rename = "CLIENTE", alias = "CUSTOMER")]
    Customer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "ADMIN",
            Role::Manager => "GESTOR",
            Role::Customer => "CLIENTE",
        }
    }

    pub const fn is_administrator(self) -> bool {
        matches!(self, Role::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full serialized user view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Listing projection: id, name, username, email, role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    /// The user's first name.
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}
