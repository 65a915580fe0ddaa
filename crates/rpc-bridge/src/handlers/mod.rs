//! # Action Handlers
//!
//! One function per action, each `fn(Payload, &dyn IdentityStore) ->
//! Result<ResponseEnvelope, HandlerFault>`.
//!
//! Inside a handler, early business answers and faults both travel through
//! `?` as a [`Rejection`]; [`settle`] turns the answer back into an ordinary
//! `Ok` response so only real faults reach the dispatcher as errors.

pub mod admin;
pub mod auth;
pub mod profile;
pub mod requests;
pub mod token;

use crate::domain::action::ActionKind;
use crate::domain::error::HandlerFault;
use crate::registry::Handler;
use bridge_types::ResponseEnvelope;
use identity_store::{StoreError, UserRecord};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub(crate) const MSG_USERNAME_TAKEN: &str = "username already exists";
pub(crate) const MSG_EMAIL_TAKEN: &str = "email already registered";
pub(crate) const MSG_USER_NOT_FOUND: &str = "user not found";

/// Standard handler for `kind`.
pub fn handler_for(kind: ActionKind) -> Handler {
    match kind {
        ActionKind::Authenticate => Arc::new(auth::authenticate),
        ActionKind::Register => Arc::new(auth::register),
        ActionKind::GetProfile => Arc::new(profile::get_profile),
        ActionKind::ListUsers => Arc::new(profile::list_users),
        ActionKind::UpdateProfile => Arc::new(profile::update_profile),
        ActionKind::AdminUpdateUser => Arc::new(admin::admin_update_user),
        ActionKind::SetPassword => Arc::new(profile::set_password),
    }
}

/// Why a handler stopped early.
#[derive(Debug)]
pub(crate) enum Rejection {
    /// A business answer (400/401/403/404).
    Respond(ResponseEnvelope),
    Fault(HandlerFault),
}

impl From<ResponseEnvelope> for Rejection {
    fn from(response: ResponseEnvelope) -> Self {
        Rejection::Respond(response)
    }
}

impl From<HandlerFault> for Rejection {
    fn from(fault: HandlerFault) -> Self {
        Rejection::Fault(fault)
    }
}

impl From<StoreError> for Rejection {
    fn from(error: StoreError) -> Self {
        Rejection::Fault(HandlerFault::Store(error))
    }
}

pub(crate) type Step<T> = Result<T, Rejection>;

pub(crate) fn settle(step: Step<ResponseEnvelope>) -> Result<ResponseEnvelope, HandlerFault> {
    match step {
        Ok(response) | Err(Rejection::Respond(response)) => Ok(response),
        Err(Rejection::Fault(fault)) => Err(fault),
    }
}

/// Answer uniqueness conflicts and lookups of vanished users; anything else
/// is a fault.
pub(crate) fn store_outcome(error: StoreError) -> Rejection {
    match error {
        StoreError::DuplicateUsername(_) => ResponseEnvelope::bad_request(MSG_USERNAME_TAKEN).into(),
        StoreError::DuplicateEmail(_) => ResponseEnvelope::bad_request(MSG_EMAIL_TAKEN).into(),
        StoreError::NotFound(_) => ResponseEnvelope::not_found(MSG_USER_NOT_FOUND).into(),
        other => other.into(),
    }
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, HandlerFault> {
    serde_json::to_value(value).map_err(|e| HandlerFault::Serialization(e.to_string()))
}

pub(crate) fn user_value(user: &UserRecord) -> Result<Value, HandlerFault> {
    to_value(&user.view())
}
