//! Self-service actions: `GET_PROFILE`, `LIST_USERS`, `UPDATE_PROFILE`,
//! `SET_PASSWORD`.

use super::requests::{parse, require, SetPasswordRequest, TokenRequest, UpdateProfileRequest};
use super::token::resolve_caller;
use super::{settle, store_outcome, to_value, user_value, Step};
use crate::domain::error::HandlerFault;
use bridge_types::{Payload, ResponseEnvelope, UserSummary};
use identity_store::{IdentityStore, UserPatch};

pub fn get_profile(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(get_profile_step(payload, store))
}

fn get_profile_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: TokenRequest = parse(payload)?;
    let user = resolve_caller(request.token.as_deref(), store)?;
    Ok(ResponseEnvelope::ok("profile retrieved").with_field("user", user_value(&user)?))
}

/// Every account, projected to the listing fields. Unpaginated.
///
/// Any other payload fields (such as `admin_token`) are ignored.
pub fn list_users(
    _payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    let results: Vec<UserSummary> = store.list_users()?.iter().map(|u| u.summary()).collect();

    Ok(ResponseEnvelope::ok("users listed")
        .with_field("count", results.len())
        .with_field("results", to_value(&results)?))
}

/// Merge-patch the caller's own profile.
pub fn update_profile(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(update_profile_step(payload, store))
}

fn update_profile_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: UpdateProfileRequest = parse(payload)?;
    let caller = resolve_caller(request.token.as_deref(), store)?;

    let patch = UserPatch::from(request.changes());
    let updated = store.update_user(caller.id, patch).map_err(store_outcome)?;

    Ok(ResponseEnvelope::ok("profile updated").with_field("user", user_value(&updated)?))
}

/// Change the caller's password after re-verifying the current one.
pub fn set_password(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(set_password_step(payload, store))
}

fn set_password_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: SetPasswordRequest = parse(payload)?;
    let caller = resolve_caller(request.token.as_deref(), store)?;

    require("password", &request.new_password)?;
    if request.new_password != request.re_new_password {
        return Ok(ResponseEnvelope::bad_request("new passwords do not match"));
    }
    if store
        .authenticate(&caller.username, &request.current_password)?
        .is_none()
    {
        return Ok(ResponseEnvelope::bad_request("current password is incorrect"));
    }

    store.set_password(caller.id, &request.new_password)?;
    Ok(ResponseEnvelope::ok("password updated"))
}
