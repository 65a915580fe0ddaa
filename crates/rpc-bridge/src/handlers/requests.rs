//! Typed request bodies, validated at the handler boundary.
//!
//! A payload that does not fit its action's struct is answered with
//! `400 invalid payload: <reason>`.

use super::Step;
use bridge_types::{Payload, ResponseEnvelope, Role};
use identity_store::{UserId, UserPatch};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Deserialize `payload` into `T`.
pub(crate) fn parse<T: DeserializeOwned>(payload: Payload) -> Step<T> {
    serde_json::from_value(Value::Object(payload))
        .map_err(|e| ResponseEnvelope::bad_request(format!("invalid payload: {e}")).into())
}

/// `400 <field> must not be empty` for a blank `value`.
pub(crate) fn require(field: &str, value: &str) -> Step<()> {
    if value.trim().is_empty() {
        return Err(ResponseEnvelope::bad_request(format!("{field} must not be empty")).into());
    }
    Ok(())
}

/// `LOGIN`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `REGISTER`
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// `GET_PROFILE`
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Self-editable profile fields.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<ProfileChanges> for UserPatch {
    fn from(changes: ProfileChanges) -> Self {
        UserPatch {
            username: changes.username,
            email: changes.email,
            first_name: changes.first_name,
            last_name: changes.last_name,
            ..Default::default()
        }
    }
}

/// `UPDATE_PROFILE`
///
/// Changes are read from `data`; without `data`, from the top level.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Option<ProfileChanges>,
    #[serde(flatten)]
    pub inline: ProfileChanges,
}

impl UpdateProfileRequest {
    pub fn changes(self) -> ProfileChanges {
        self.data.unwrap_or(self.inline)
    }
}

/// Fields an administrator may change on any account.
#[derive(Debug, Default, Deserialize)]
pub struct AdminChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl From<AdminChanges> for UserPatch {
    fn from(changes: AdminChanges) -> Self {
        UserPatch {
            username: changes.username,
            email: changes.email,
            first_name: changes.first_name,
            last_name: changes.last_name,
            role: changes.role,
            is_active: changes.is_active,
            password: changes.password,
        }
    }
}

/// `ADMIN_UPDATE_USER`
#[derive(Debug, Deserialize)]
pub struct AdminUpdateRequest {
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(deserialize_with = "user_id")]
    pub target_id: UserId,
    #[serde(default)]
    pub data: AdminChanges,
}

/// `SET_PASSWORD`
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub current_password: String,
    pub new_password: String,
    pub re_new_password: String,
}

/// Accept an id as a JSON integer or a numeric string.
fn user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(UserId),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("target_id is not a user id: {text:?}"))),
    }
}
