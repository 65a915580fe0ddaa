//! # End-to-End Bridge Tests
//!
//! Every action driven through the bus:
//!
//! ```text
//! [client] ──request──→ auth-request ──→ [Listener] ──→ [Dispatcher] ──→ [IdentityStore]
//!                                                                              │
//! [client] ←─response── auth-response ←── [Publisher] ←── ResponseEnvelope ←───┘
//! ```
//!
//! ## Test Categories
//!
//! 1. **Account Lifecycle**: register, login, profile, password change
//! 2. **Administration**: role checks and admin edits
//! 3. **Bad Input**: malformed bytes, unknown actions, missing tokens

#[cfg(test)]
mod tests {
    use super::super::harness::*;
    use bridge_types::{CorrelationId, Status};
    use serde_json::json;

    fn register(correlation_id: &str, username: &str, email: &str) -> serde_json::Value {
        json!({
            "type": "REGISTER",
            "correlationId": correlation_id,
            "username": username,
            "email": email,
            "password": "p1",
            "first_name": "Ana",
        })
    }

    // =========================================================================
    // ACCOUNT LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_register_twice_echoes_correlation_id() {
        let harness = BridgeHarness::start();

        let first = harness.call(register("c1", "u1", "u1@x.com")).await;
        assert_eq!(first.status, Status::Created);
        assert_eq!(first.correlation_id, Some(CorrelationId::from("c1")));
        assert!(first.field("token").unwrap().is_string());
        assert_eq!(first.field("user").unwrap()["role"], "CLIENTE");

        let second = harness.call(register("c1", "u1", "u1@x.com")).await;
        assert_eq!(second.status, Status::BadRequest);
        assert_eq!(second.msg, "username already exists");
        assert_eq!(second.correlation_id, Some(CorrelationId::from("c1")));

        // admin + u1
        assert_eq!(harness.store.len(), 2);
    }

    #[tokio::test]
    async fn test_login_then_get_profile() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;

        let token = harness.login("u1", "p1").await;
        let profile = harness
            .call(json!({"type": "GET_PROFILE", "correlationId": "p1", "token": token}))
            .await;

        assert_eq!(profile.status, Status::Ok);
        let user = profile.field("user").unwrap();
        assert_eq!(user["username"], "u1");
        assert_eq!(user["first_name"], "Ana");
        assert_eq!(user["is_active"], true);
    }

    #[tokio::test]
    async fn test_token_scheme_prefix_accepted() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;
        let token = harness.login("u1", "p1").await;

        let profile = harness
            .call(json!({
                "type": "GET_PROFILE",
                "correlationId": "p1",
                "token": format!("Token {token}"),
            }))
            .await;
        assert_eq!(profile.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;

        let response = harness
            .call(json!({
                "type": "LOGIN",
                "correlationId": "l1",
                "username": "u1",
                "password": "nope",
            }))
            .await;
        assert_eq!(response.status, Status::Unauthorized);
        assert!(response.field("token").is_none());
    }

    #[tokio::test]
    async fn test_partial_profile_update_keeps_other_fields() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;
        let token = harness.login("u1", "p1").await;

        let updated = harness
            .call(json!({
                "type": "UPDATE_PROFILE",
                "correlationId": "up1",
                "token": token,
                "data": {"last_name": "Silva"},
            }))
            .await;

        assert_eq!(updated.status, Status::Ok);
        let user = updated.field("user").unwrap();
        assert_eq!(user["last_name"], "Silva");
        assert_eq!(user["first_name"], "Ana");
        assert_eq!(user["email"], "u1@x.com");
    }

    #[tokio::test]
    async fn test_profile_update_to_taken_email_rejected() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;
        harness.call(register("r2", "u2", "u2@x.com")).await;
        let token = harness.login("u2", "p1").await;

        let response = harness
            .call(json!({
                "type": "UPDATE_PROFILE",
                "correlationId": "up1",
                "token": token,
                "email": "u1@x.com",
            }))
            .await;
        assert_eq!(response.status, Status::BadRequest);
        assert_eq!(response.msg, "email already registered");
    }

    #[tokio::test]
    async fn test_set_password_flow() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;
        let token = harness.login("u1", "p1").await;

        let mismatch = harness
            .call(json!({
                "type": "SET_PASSWORD",
                "correlationId": "sp1",
                "token": token,
                "current_password": "p1",
                "new_password": "p2",
                "re_new_password": "p3",
            }))
            .await;
        assert_eq!(mismatch.status, Status::BadRequest);
        assert_eq!(mismatch.msg, "new passwords do not match");

        let changed = harness
            .call(json!({
                "type": "SET_PASSWORD",
                "correlationId": "sp2",
                "token": token,
                "current_password": "p1",
                "new_password": "p2",
                "re_new_password": "p2",
            }))
            .await;
        assert_eq!(changed.status, Status::Ok);

        let old = harness
            .call(json!({
                "type": "LOGIN",
                "correlationId": "l-old",
                "username": "u1",
                "password": "p1",
            }))
            .await;
        assert_eq!(old.status, Status::Unauthorized);
        harness.login("u1", "p2").await;
    }

    #[tokio::test]
    async fn test_list_users_summaries() {
        let harness = BridgeHarness::start();
        harness.call(register("r1", "u1", "u1@x.com")).await;

        let listing = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "ls1"}))
            .await;
        assert_eq!(listing.status, Status::Ok);
        assert_eq!(listing.field("count").unwrap(), 2);

        let results = listing.field("results").unwrap().as_array().unwrap();
        assert_eq!(results[0]["username"], ADMIN_USERNAME);
        assert_eq!(results[1]["name"], "Ana");
        assert!(results[1].get("is_active").is_none());
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    #[tokio::test]
    async fn test_admin_update_requires_admin_role() {
        let harness = BridgeHarness::start();
        let created = harness.call(register("r1", "u1", "u1@x.com")).await;
        let target = created.field("user").unwrap()["id"].clone();
        let token = harness.login("u1", "p1").await;

        let response = harness
            .call(json!({
                "type": "ADMIN_UPDATE_USER",
                "correlationId": "a1",
                "admin_token": token,
                "target_id": target,
                "data": {"role": "ADMIN"},
            }))
            .await;
        assert_eq!(response.status, Status::Forbidden);
        assert_eq!(response.msg, "administrator role required");
    }

    #[tokio::test]
    async fn test_admin_deactivates_user() {
        let harness = BridgeHarness::start();
        let created = harness.call(register("r1", "u1", "u1@x.com")).await;
        let target = created.field("user").unwrap()["id"].as_u64().unwrap();
        let admin_token = harness.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;

        let response = harness
            .call(json!({
                "type": "ADMIN_UPDATE_USER",
                "correlationId": "a1",
                "admin_token": admin_token,
                "target_id": target.to_string(),
                "data": {"is_active": false, "role": "GESTOR"},
            }))
            .await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.msg, "user u1 updated");
        assert_eq!(response.field("user").unwrap()["role"], "GESTOR");

        let login = harness
            .call(json!({
                "type": "LOGIN",
                "correlationId": "l1",
                "username": "u1",
                "password": "p1",
            }))
            .await;
        assert_eq!(login.status, Status::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_update_unknown_target() {
        let harness = BridgeHarness::start();
        let admin_token = harness.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;

        let response = harness
            .call(json!({
                "type": "ADMIN_UPDATE_USER",
                "correlationId": "a1",
                "admin_token": admin_token,
                "target_id": 999,
                "data": {"first_name": "X"},
            }))
            .await;
        assert_eq!(response.status, Status::NotFound);
    }

    // =========================================================================
    // BAD INPUT
    // =========================================================================

    #[tokio::test]
    async fn test_malformed_bytes_answered_with_salvaged_id() {
        let harness = BridgeHarness::start();
        harness.send_raw(br#"{"type": "LOGIN", "correlationId": "bad-1", "#.to_vec());
        harness.send_raw(b"\xff\xfe not even text".to_vec());

        let responses = harness.wait_for_responses(2).await;
        assert_eq!(responses[0].status, Status::InternalError);
        assert!(responses[0].msg.starts_with("malformed request"));
        assert_eq!(responses[0].correlation_id, Some(CorrelationId::from("bad-1")));
        assert_eq!(responses[1].status, Status::InternalError);
        assert_eq!(responses[1].correlation_id, None);

        // The listener survives both.
        let listing = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "after"}))
            .await;
        assert_eq!(listing.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_unsupported_and_missing_action() {
        let harness = BridgeHarness::start();

        let unknown = harness
            .call(json!({"type": "DELETE_EVERYTHING", "correlationId": "x1"}))
            .await;
        assert_eq!(unknown.status, Status::BadRequest);
        assert_eq!(unknown.msg, "unsupported action");

        let missing = harness.call(json!({"correlationId": "x2"})).await;
        assert_eq!(missing.status, Status::BadRequest);
        assert_eq!(missing.msg, "unsupported action");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_tokens() {
        let harness = BridgeHarness::start();

        let missing = harness
            .call(json!({"type": "GET_PROFILE", "correlationId": "t1"}))
            .await;
        assert_eq!(missing.status, Status::BadRequest);

        let invalid = harness
            .call(json!({"type": "GET_PROFILE", "correlationId": "t2", "token": "deadbeef"}))
            .await;
        assert_eq!(invalid.status, Status::Unauthorized);
    }

    #[tokio::test]
    async fn test_request_without_correlation_id_gets_null() {
        let harness = BridgeHarness::start();
        harness.send(json!({"type": "LIST_USERS"}));

        let responses = harness.wait_for_responses(1).await;
        assert_eq!(responses[0].status, Status::Ok);
        assert_eq!(responses[0].correlation_id, None);

        let raw: serde_json::Value =
            serde_json::from_slice(&harness.broker.messages(&harness.config.response_topic)[0])
                .unwrap();
        assert!(raw["correlationId"].is_null());
    }
}
