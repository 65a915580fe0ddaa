//! Request-type tags understood by the standard registry.

use std::fmt;

/// Action selected by a request's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `LOGIN`
    Authenticate,
    /// `REGISTER`
    Register,
    /// `GET_PROFILE`
    GetProfile,
    /// `LIST_USERS`
    ListUsers,
    /// `UPDATE_PROFILE`
    UpdateProfile,
    /// `ADMIN_UPDATE_USER`
    AdminUpdateUser,
    /// `SET_PASSWORD`
    SetPassword,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Authenticate,
        ActionKind::Register,
        ActionKind::GetProfile,
        ActionKind::ListUsers,
        ActionKind::UpdateProfile,
        ActionKind::AdminUpdateUser,
        ActionKind::SetPassword,
    ];

    /// Wire tag.
    pub const fn tag(self) -> &'static str {
        match self {
            ActionKind::Authenticate => "LOGIN",
            ActionKind::Register => "REGISTER",
            ActionKind::GetProfile => "GET_PROFILE",
            ActionKind::ListUsers => "LIST_USERS",
            ActionKind::UpdateProfile => "UPDATE_PROFILE",
            ActionKind::AdminUpdateUser => "ADMIN_UPDATE_USER",
            ActionKind::SetPassword => "SET_PASSWORD",
        }
    }

    /// Exact, case-sensitive tag lookup.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
