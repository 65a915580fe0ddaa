//! # Delivery Semantics Tests
//!
//! What the bridge guarantees about messages rather than about actions:
//!
//! 1. **Ordering**: one listener answers in request order
//! 2. **Commit Policy**: on-receipt loses an unanswered request across a
//!    crash, after-publish redelivers it
//! 3. **Retries**: transient publish failures are retried, exhaustion drops
//! 4. **Faults**: deadlines, store outages and panics become 500 responses
//! 5. **Scale-out**: several listeners share one consumer group

#[cfg(test)]
mod tests {
    use super::super::harness::*;
    use bridge_types::{CorrelationId, ResponseEnvelope, Status};
    use rpc_bridge::{ActionRegistry, BridgeConfig, CommitPolicy, FaultDetail, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;

    fn ids(responses: &[ResponseEnvelope]) -> Vec<String> {
        responses
            .iter()
            .map(|r| {
                r.correlation_id
                    .as_ref()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Standard actions plus `SLOW`, which sleeps, and `PANIC`, which panics.
    fn registry_with_misbehaving_actions() -> ActionRegistry {
        ActionRegistry::builder()
            .with_standard_actions()
            .register("SLOW", |_, _| {
                std::thread::sleep(Duration::from_millis(300));
                Ok(ResponseEnvelope::ok("finally"))
            })
            .register("PANIC", |_, _| panic!("boom"))
            .build()
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_single_listener_preserves_request_order() {
        let harness = BridgeHarness::start();
        for i in 0..20 {
            harness.send(json!({"type": "LIST_USERS", "correlationId": format!("o{i:02}")}));
        }

        let responses = harness.wait_for_responses(20).await;
        let expected: Vec<String> = (0..20).map(|i| format!("o{i:02}")).collect();
        assert_eq!(ids(&responses), expected);
    }

    #[tokio::test]
    async fn test_multiple_listeners_answer_everything_once() {
        let config = BridgeConfig {
            listeners: 4,
            ..test_config()
        };
        let mut harness = BridgeHarness::start_with(config, ActionRegistry::standard());
        for i in 0..40 {
            harness.send(json!({"type": "LIST_USERS", "correlationId": format!("m{i:02}")}));
        }

        let responses = harness.wait_for_responses(40).await;
        let mut seen = ids(&responses);
        seen.sort();
        let expected: Vec<String> = (0..40).map(|i| format!("m{i:02}")).collect();
        assert_eq!(seen, expected);

        let stats = harness.stop().await;
        assert_eq!(stats.received, 40);
        assert_eq!(stats.published, 40);
    }

    // =========================================================================
    // COMMIT POLICY
    // =========================================================================

    /// The only publish attempt for a request fails; the bridge then crashes
    /// and restarts from the committed offset.
    async fn crash_with_unpublished_request(policy: CommitPolicy) -> Vec<ResponseEnvelope> {
        let config = BridgeConfig {
            commit_policy: policy,
            retry: RetryPolicy {
                attempts: 1,
                base_backoff: Duration::from_millis(1),
            },
            ..test_config()
        };
        let mut harness = BridgeHarness::start_with(config, ActionRegistry::standard());
        harness.broker.fail_next_publishes(1);
        harness.send(json!({"type": "LIST_USERS", "correlationId": "lost?"}));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let committed = harness
            .broker
            .committed_offset(&harness.config.request_topic, &harness.config.group);
        match policy {
            CommitPolicy::OnReceipt => assert_eq!(committed, 1),
            CommitPolicy::AfterPublish => assert_eq!(committed, 0),
        }

        let stats = harness.crash_and_restart().await;
        assert_eq!(stats.received, 1);
        assert_eq!(stats.publish_failures, 1);
        assert!(harness.responses().is_empty());

        harness.send(json!({"type": "LIST_USERS", "correlationId": "marker"}));
        harness.wait_for_responses(1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let responses = harness.responses();
        harness.stop().await;
        responses
    }

    #[tokio::test]
    async fn test_on_receipt_loses_unanswered_request() {
        let responses = crash_with_unpublished_request(CommitPolicy::OnReceipt).await;
        assert_eq!(ids(&responses), vec!["marker".to_string()]);
    }

    #[tokio::test]
    async fn test_after_publish_redelivers_unanswered_request() {
        let responses = crash_with_unpublished_request(CommitPolicy::AfterPublish).await;
        assert_eq!(
            ids(&responses),
            vec!["lost?".to_string(), "marker".to_string()]
        );
    }

    #[tokio::test]
    async fn test_after_publish_failed_request_survives_later_success() {
        let config = BridgeConfig {
            commit_policy: CommitPolicy::AfterPublish,
            retry: RetryPolicy {
                attempts: 1,
                base_backoff: Duration::from_millis(1),
            },
            ..test_config()
        };
        let mut harness = BridgeHarness::start_with(config, ActionRegistry::standard());
        harness.broker.fail_next_publishes(1);
        harness.send(json!({"type": "LIST_USERS", "correlationId": "first"}));

        let second = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "second"}))
            .await;
        assert_eq!(second.status, Status::Ok);
        assert_eq!(
            harness
                .broker
                .committed_offset(&harness.config.request_topic, &harness.config.group),
            0
        );

        let stats = harness.crash_and_restart().await;
        assert_eq!(stats.publish_failures, 1);

        let responses = harness.wait_for_responses(2).await;
        assert_eq!(
            ids(&responses),
            vec!["second".to_string(), "first".to_string()]
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.responses().len(), 2);
        assert_eq!(
            harness
                .broker
                .committed_offset(&harness.config.request_topic, &harness.config.group),
            2
        );
        harness.stop().await;
    }

    // =========================================================================
    // RETRIES
    // =========================================================================

    #[tokio::test]
    async fn test_transient_publish_failure_retried() {
        let harness = BridgeHarness::start();
        harness.broker.fail_next_publishes(2);

        let response = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "r1"}))
            .await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(harness.responses().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_publish_dropped_and_listener_continues() {
        let mut harness = BridgeHarness::start();
        harness.broker.fail_next_publishes(3);
        harness.send(json!({"type": "LIST_USERS", "correlationId": "dropped"}));

        let response = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "kept"}))
            .await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(ids(&harness.responses()), vec!["kept".to_string()]);

        let stats = harness.stop().await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.publish_failures, 1);
    }

    // =========================================================================
    // FAULTS
    // =========================================================================

    #[tokio::test]
    async fn test_deadline_answers_500_and_keeps_serving() {
        let config = BridgeConfig {
            dispatch_deadline: Some(Duration::from_millis(50)),
            ..test_config()
        };
        let harness = BridgeHarness::start_with(config, registry_with_misbehaving_actions());

        let slow = harness
            .call(json!({"type": "SLOW", "correlationId": "s1"}))
            .await;
        assert_eq!(slow.status, Status::InternalError);
        assert_eq!(slow.msg, "request deadline exceeded");
        assert_eq!(slow.correlation_id, Some(CorrelationId::from("s1")));

        let next = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "s2"}))
            .await;
        assert_eq!(next.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_panicking_handler_answers_500() {
        let harness = BridgeHarness::start_with(test_config(), registry_with_misbehaving_actions());

        let response = harness
            .call(json!({"type": "PANIC", "correlationId": "p1"}))
            .await;
        assert_eq!(response.status, Status::InternalError);
        assert!(response.msg.contains("boom"));

        let next = harness
            .call(json!({"type": "LIST_USERS", "correlationId": "p2"}))
            .await;
        assert_eq!(next.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_store_outage_answers_500() {
        let harness = BridgeHarness::start();
        harness.store.set_available(false);

        let response = harness
            .call(json!({
                "type": "LOGIN",
                "correlationId": "o1",
                "username": ADMIN_USERNAME,
                "password": ADMIN_PASSWORD,
            }))
            .await;
        assert_eq!(response.status, Status::InternalError);

        harness.store.set_available(true);
        let token = harness.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_redacted_fault_detail_hides_cause() {
        let config = BridgeConfig {
            fault_detail: FaultDetail::Redacted,
            ..test_config()
        };
        let harness = BridgeHarness::start_with(config, registry_with_misbehaving_actions());

        let response = harness
            .call(json!({"type": "PANIC", "correlationId": "p1"}))
            .await;
        assert_eq!(response.status, Status::InternalError);
        assert_eq!(response.msg, "internal error");

        harness.send_raw(b"garbage".to_vec());
        let responses = harness.wait_for_responses(2).await;
        assert_eq!(responses[1].msg, "malformed request");
    }
}
