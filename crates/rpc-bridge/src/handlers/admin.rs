//! `ADMIN_UPDATE_USER`.

use super::requests::{parse, require, AdminUpdateRequest};
use super::token::resolve_caller;
use super::{settle, store_outcome, user_value, Step, MSG_USER_NOT_FOUND};
use crate::domain::error::HandlerFault;
use bridge_types::{Payload, ResponseEnvelope};
use identity_store::{IdentityStore, UserPatch};
use tracing::warn;

/// Merge-patch any account on behalf of an administrator.
///
/// The caller is resolved from `admin_token` and must hold the administrator
/// role before the target is even looked up.
pub fn admin_update_user(
    payload: Payload,
    store: &dyn IdentityStore,
) -> Result<ResponseEnvelope, HandlerFault> {
    settle(admin_update_step(payload, store))
}

fn admin_update_step(payload: Payload, store: &dyn IdentityStore) -> Step<ResponseEnvelope> {
    let request: AdminUpdateRequest = parse(payload)?;
    let admin = resolve_caller(request.admin_token.as_deref(), store)?;

    if !admin.role.is_administrator() {
        warn!(
            user_id = admin.id,
            role = %admin.role,
            target_id = request.target_id,
            "Administrator action refused"
        );
        return Ok(ResponseEnvelope::forbidden("administrator role required"));
    }

    if store.find_by_id(request.target_id)?.is_none() {
        return Ok(ResponseEnvelope::not_found(MSG_USER_NOT_FOUND));
    }

    let patch = UserPatch::from(request.data);
    if let Some(password) = patch.password.as_deref() {
        require("password", password)?;
    }

    let updated = store
        .update_user(request.target_id, patch)
        .map_err(store_outcome)?;

    Ok(
        ResponseEnvelope::ok(format!("user {} updated", updated.username))
            .with_field("user", user_value(&updated)?),
    )
}
