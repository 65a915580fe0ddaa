//! # Bridge Service
//!
//! Wires the registry, store and sink into a dispatcher and runs one
//! [`InboundListener`] per consumer handed to [`BridgeService::start`].
//!
//! All listeners of a service share one dispatcher and one shutdown signal.
//! They belong to the same consumer group, so the broker spreads requests
//! across them; ordering holds per listener only.

use crate::dispatcher::Dispatcher;
use crate::domain::config::BridgeConfig;
use crate::domain::error::BridgeError;
use crate::listener::{InboundListener, ListenerStats};
use crate::publisher::OutboundPublisher;
use crate::registry::ActionRegistry;
use bridge_bus::{RequestConsumer, ResponseSink};
use identity_store::IdentityStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct BridgeService {
    config: BridgeConfig,
    dispatcher: Arc<Dispatcher>,
    publisher: OutboundPublisher,
    shutdown_tx: watch::Sender<bool>,
    listeners: Vec<JoinHandle<ListenerStats>>,
}

impl BridgeService {
    /// Build a service; fails if `config` does not validate.
    pub fn new(
        config: BridgeConfig,
        registry: Arc<ActionRegistry>,
        store: Arc<dyn IdentityStore>,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        let dispatcher = Dispatcher::new(registry, store)
            .with_deadline(config.dispatch_deadline)
            .with_fault_detail(config.fault_detail);
        let publisher = OutboundPublisher::new(sink, config.response_topic.clone(), config.retry);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            publisher,
            shutdown_tx,
            listeners: Vec::new(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Spawn one listener per consumer.
    pub fn start<C>(&mut self, consumers: Vec<C>)
    where
        C: RequestConsumer + 'static,
    {
        for consumer in consumers {
            let id = self.listeners.len();
            let listener = InboundListener::new(
                id,
                consumer,
                Arc::clone(&self.dispatcher),
                self.publisher.clone(),
                self.config.commit_policy,
                self.shutdown_tx.subscribe(),
            );
            self.listeners.push(tokio::spawn(listener.run()));
        }

        info!(
            listeners = self.listeners.len(),
            group = %self.config.group,
            request_topic = %self.config.request_topic,
            response_topic = %self.config.response_topic,
            commit_policy = %self.config.commit_policy,
            "Bridge service started"
        );
    }

    pub fn running(&self) -> usize {
        self.listeners.iter().filter(|h| !h.is_finished()).count()
    }

    /// Signal every listener to stop after its current request.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Signal shutdown and wait for every listener.
    pub async fn stop(self) -> ListenerStats {
        self.shutdown();
        self.join().await
    }

    /// Wait for every listener to finish on its own and sum their stats.
    pub async fn join(self) -> ListenerStats {
        let mut total = ListenerStats::default();
        for handle in self.listeners {
            match handle.await {
                Ok(stats) => total += stats,
                Err(e) => error!(error = %e, "Listener task failed"),
            }
        }
        info!(
            received = total.received,
            published = total.published,
            "Bridge service stopped"
        );
        total
    }
}
