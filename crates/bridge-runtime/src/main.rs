//! # Identity Bridge
//!
//! Serves the authentication and user-management actions over the broker.
//!
//! ```text
//! request topic ──→ InboundListener ──→ Dispatcher ──→ handler ──→ IdentityStore
//!                         │                                              │
//!                         └──── OutboundPublisher ←── ResponseEnvelope ←─┘
//!                                      │
//!                                      ↓
//!                               response topic
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use bridge_bus::nats::redact_url;
use bridge_bus::JetStreamBroker;
use bridge_runtime::telemetry::init_tracing;
use bridge_runtime::{LogFormat, RuntimeConfig};
use identity_store::InMemoryIdentityStore;
use rpc_bridge::{ActionRegistry, BridgeService, ListenerStats};

/// The running bridge: broker handle plus listener service.
struct BridgeRuntime {
    config: RuntimeConfig,
    broker: JetStreamBroker,
    service: BridgeService,
}

impl BridgeRuntime {
    /// Connect to the broker and build the service.
    async fn connect(config: RuntimeConfig) -> Result<Self> {
        let broker = JetStreamBroker::connect(&config.broker_url, config.connect_timeout)
            .await
            .context("broker unreachable")?;
        broker.ensure_topic(&config.bridge.request_topic).await?;
        broker.ensure_topic(&config.bridge.response_topic).await?;

        let store = Arc::new(InMemoryIdentityStore::new());
        if let Some(seed) = &config.admin_seed {
            let admin = store
                .seed_admin(&seed.username, &seed.email, &seed.password)
                .context("failed to seed administrator")?;
            info!(user_id = admin.id, username = %admin.username, "Administrator available");
        }

        let service = BridgeService::new(
            config.bridge.clone(),
            Arc::new(ActionRegistry::standard()),
            store,
            Arc::new(broker.clone()),
        )?;

        Ok(Self {
            config,
            broker,
            service,
        })
    }

    /// Spawn the configured number of listeners.
    async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  Identity Bridge v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let bridge = &self.config.bridge;
        let mut consumers = Vec::with_capacity(bridge.listeners);
        for _ in 0..bridge.listeners {
            consumers.push(
                self.broker
                    .consumer(&bridge.request_topic, &bridge.group, bridge.ack_wait())
                    .await
                    .context("failed to join consumer group")?,
            );
        }
        self.service.start(consumers);

        info!("Environment: {}", self.config.environment);
        info!("Broker: {}", redact_url(&self.config.broker_url));
        info!("Consumer group: {}", bridge.group);
        Ok(())
    }

    async fn shutdown(self) -> ListenerStats {
        info!("Initiating graceful shutdown...");
        let stats = self.service.stop().await;
        info!("Shutdown complete");
        stats
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default())?;
            error!("Invalid configuration: {e}");
            return Err(e.into());
        }
    };
    init_tracing(config.log_format)?;

    let mut runtime = BridgeRuntime::connect(config).await?;
    runtime.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Received shutdown signal");

    let stats = runtime.shutdown().await;
    info!(
        received = stats.received,
        published = stats.published,
        decode_failures = stats.decode_failures,
        publish_failures = stats.publish_failures,
        commit_failures = stats.commit_failures,
        "Final listener statistics"
    );
    Ok(())
}
