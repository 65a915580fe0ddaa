//! `LOGIN` and `REGISTER`.

use super::requests::{parse, require, LoginRequest, RegisterRequest};
use super::{settle, store_outcome, user_value, Step, MSG_EMAIL_TAKEN, MSG_USERNAME_TAKEN};
use crate::domain::error::HandlerFault;
use bridge_types::{Payload, ResponseEnvelope};
use identity_store::{IdentityStore, NewUser};
use tracing::debug;

/// Verify credentials and hand out the account's standing token.
pub fn authenticate(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(authenticate_step(payload, store))
}

fn authenticate_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: LoginRequest = parse(payload)?;

    let Some(user) = store.authenticate(&request.username, &request.password)? else {
        return Ok(ResponseEnvelope::unauthorized("invalid credentials"));
    };
    if !user.is_active {
        debug!(user_id = user.id, "Login refused for inactive account");
        return Ok(ResponseEnvelope::forbidden("inactive account"));
    }

    let token = store.issue_token(user.id)?;
    Ok(ResponseEnvelope::ok("login successful")
        .with_field("token", token.as_str())
        .with_field("user", user_value(&user)?))
}

/// Create a customer account after checking username, then email.
pub fn register(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(register_step(payload, store))
}

fn register_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: RegisterRequest = parse(payload)?;
    require("username", &request.username)?;
    require("email", &request.email)?;
    require("password", &request.password)?;

    if store.username_taken(&request.username)? {
        return Ok(ResponseEnvelope::bad_request(MSG_USERNAME_TAKEN));
    }
    if store.email_taken(&request.email)? {
        return Ok(ResponseEnvelope::bad_request(MSG_EMAIL_TAKEN));
    }

    // The store re-checks both under its write lock; a concurrent
    // registration surfaces here as a conflict.
    let user = store
        .create_user(
            NewUser::new(request.username, request.email, request.password)
                .with_names(request.first_name, request.last_name),
        )
        .map_err(store_outcome)?;
    let token = store.issue_token(user.id)?;

    Ok(ResponseEnvelope::created("user created")
        .with_field("token", token.as_str())
        .with_field("user", user_value(&user)?))
}
