//! Test fixture: an in-memory broker, an identity store and a bridge service
//! wired together the way the runtime wires them.

use std::sync::Arc;
use std::time::Duration;

use bridge_bus::InMemoryBroker;
use bridge_types::ResponseEnvelope;
use identity_store::InMemoryIdentityStore;
use rpc_bridge::{ActionRegistry, BridgeConfig, BridgeService, ListenerStats, RetryPolicy};
use serde_json::Value;

/// How long any wait in a test may take before it counts as a hang.
pub const WAIT: Duration = Duration::from_secs(3);

pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "root-pass";

/// Bridge configuration with fast retries.
pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        retry: RetryPolicy {
            attempts: 3,
            base_backoff: Duration::from_millis(1),
        },
        ..BridgeConfig::default()
    }
}

pub struct BridgeHarness {
    pub broker: InMemoryBroker,
    pub store: Arc<InMemoryIdentityStore>,
    pub config: BridgeConfig,
    registry: Arc<ActionRegistry>,
    service: Option<BridgeService>,
}

impl BridgeHarness {
    /// Standard actions, one listener, seeded administrator.
    pub fn start() -> Self {
        Self::start_with(test_config(), ActionRegistry::standard())
    }

    pub fn start_with(config: BridgeConfig, registry: ActionRegistry) -> Self {
        let store = Arc::new(InMemoryIdentityStore::new());
        store
            .seed_admin(ADMIN_USERNAME, "root@example.com", ADMIN_PASSWORD)
            .unwrap();

        let mut harness = Self {
            broker: InMemoryBroker::new(),
            store,
            config,
            registry: Arc::new(registry),
            service: None,
        };
        harness.launch();
        harness
    }

    fn launch(&mut self) {
        let mut service = BridgeService::new(
            self.config.clone(),
            Arc::clone(&self.registry),
            self.store.clone(),
            Arc::new(self.broker.clone()),
        )
        .unwrap();
        let consumers: Vec<_> = (0..self.config.listeners)
            .map(|_| {
                self.broker
                    .consumer(&self.config.request_topic, &self.config.group)
            })
            .collect();
        service.start(consumers);
        self.service = Some(service);
    }

    /// Stop the listeners, drop uncommitted progress and start again on the
    /// same store. Simulates a process crash followed by a restart.
    pub async fn crash_and_restart(&mut self) -> ListenerStats {
        let stats = self.stop().await;
        self.broker
            .rewind_to_committed(&self.config.request_topic, &self.config.group);
        self.launch();
        stats
    }

    pub async fn stop(&mut self) -> ListenerStats {
        match self.service.take() {
            Some(service) => tokio::time::timeout(WAIT, service.stop()).await.unwrap(),
            None => ListenerStats::default(),
        }
    }

    pub fn send(&self, request: Value) {
        self.send_raw(serde_json::to_vec(&request).unwrap());
    }

    pub fn send_raw(&self, bytes: Vec<u8>) {
        self.broker.append(&self.config.request_topic, bytes);
    }

    /// Every response published so far, in topic order.
    pub fn responses(&self) -> Vec<ResponseEnvelope> {
        self.broker
            .messages(&self.config.response_topic)
            .iter()
            .map(|bytes| ResponseEnvelope::decode(bytes).unwrap())
            .collect()
    }

    /// Wait until at least `count` responses were published.
    pub async fn wait_for_responses(&self, count: usize) -> Vec<ResponseEnvelope> {
        tokio::time::timeout(WAIT, async {
            loop {
                let responses = self.responses();
                if responses.len() >= count {
                    return responses;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("fewer than {count} responses within {WAIT:?}"))
    }

    /// Send `request` and wait for the response carrying its correlation id.
    pub async fn call(&self, request: Value) -> ResponseEnvelope {
        let id = request["correlationId"].as_str().map(str::to_string);
        let before = self.responses().len();
        self.send(request);

        let responses = self.wait_for_responses(before + 1).await;
        responses
            .into_iter()
            .skip(before)
            .find(|r| r.correlation_id.as_ref().map(|c| c.as_str().to_string()) == id)
            .unwrap_or_else(|| panic!("no response for correlation id {id:?}"))
    }

    /// Log in and return the credential token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .call(serde_json::json!({
                "type": "LOGIN",
                "correlationId": format!("login-{username}"),
                "username": username,
                "password": password,
            }))
            .await;
        response.field("token").unwrap().as_str().unwrap().to_string()
    }
}
