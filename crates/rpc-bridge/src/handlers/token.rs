//! Caller resolution from a bearer-style credential token.

use super::Step;
use bridge_types::ResponseEnvelope;
use identity_store::{IdentityStore, UserRecord};

/// Recognised scheme prefixes, matched case-sensitively.
const PREFIXES: [&str; 2] = ["Token ", "Bearer "];

pub(crate) const MSG_MISSING_TOKEN: &str = "missing credential token";
pub(crate) const MSG_INVALID_TOKEN: &str = "invalid credential token";

/// Strip one recognised prefix, if any.
pub fn strip_scheme(raw: &str) -> &str {
    PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw)
        .trim()
}

/// Resolve the account behind `raw`.
///
/// - absent or blank → 400 `missing credential token`
/// - unknown → 401 `invalid credential token`
pub(crate) fn resolve_caller(raw: Option<&str>, store: &dyn IdentityStore) -> Step<UserRecord> {
    let token = raw.map(strip_scheme).unwrap_or_default();
    if token.is_empty() {
        return Err(ResponseEnvelope::bad_request(MSG_MISSING_TOKEN).into());
    }

    store
        .find_by_token(token)?
        .ok_or_else(|| ResponseEnvelope::unauthorized(MSG_INVALID_TOKEN).into())
}
