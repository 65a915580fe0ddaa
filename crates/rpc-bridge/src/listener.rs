//! # Inbound Listener
//!
//! One sequential processing loop per consumer-group member:
//!
//! ```text
//! pull → (commit if on-receipt) → decode → dispatch → publish + await ack
//!      → (commit if after-publish) → pull …
//! ```
//!
//! The shutdown signal is only observed while waiting for the next message;
//! a request that has been pulled is always carried through to its publish.

use crate::dispatcher::Dispatcher;
use crate::domain::config::CommitPolicy;
use crate::publisher::OutboundPublisher;
use bridge_bus::{Delivery, RequestConsumer};
use bridge_types::RequestEnvelope;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Pause after a failed pull before trying again.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(250);

/// Counters reported when a listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub received: u64,
    pub published: u64,
    pub decode_failures: u64,
    pub publish_failures: u64,
    pub commit_failures: u64,
}

impl AddAssign for ListenerStats {
    fn add_assign(&mut self, other: Self) {
        self.received += other.received;
        self.published += other.published;
        self.decode_failures += other.decode_failures;
        self.publish_failures += other.publish_failures;
        self.commit_failures += other.commit_failures;
    }
}

pub struct InboundListener<C> {
    id: usize,
    consumer: C,
    dispatcher: Arc<Dispatcher>,
    publisher: OutboundPublisher,
    commit_policy: CommitPolicy,
    shutdown: watch::Receiver<bool>,
    stats: ListenerStats,
}

impl<C: RequestConsumer> InboundListener<C> {
    pub fn new(
        id: usize,
        consumer: C,
        dispatcher: Arc<Dispatcher>,
        publisher: OutboundPublisher,
        commit_policy: CommitPolicy,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            consumer,
            dispatcher,
            publisher,
            commit_policy,
            shutdown,
            stats: ListenerStats::default(),
        }
    }

    /// Run until shutdown is signalled or the broker closes.
    #[instrument(skip(self), fields(listener = self.id, commit_policy = %self.commit_policy))]
    pub async fn run(mut self) -> ListenerStats {
        info!(topic = %self.publisher.topic(), "Listener started");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => {
                    info!("Shutdown signal received");
                    break;
                }
                next = self.consumer.next_delivery() => next,
            };

            match next {
                Ok(Some(delivery)) => self.process(delivery).await,
                Ok(None) => {
                    info!("Broker closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Receive failed");
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
        }

        info!(
            received = self.stats.received,
            published = self.stats.published,
            decode_failures = self.stats.decode_failures,
            publish_failures = self.stats.publish_failures,
            commit_failures = self.stats.commit_failures,
            "Listener stopped"
        );
        self.stats
    }

    async fn process(&mut self, mut delivery: Delivery) {
        self.stats.received += 1;
        debug!(
            sequence = delivery.sequence(),
            bytes = delivery.payload().len(),
            "Request received"
        );

        if self.commit_policy == CommitPolicy::OnReceipt {
            self.commit(&mut delivery).await;
        }

        let response = match RequestEnvelope::decode(delivery.payload()) {
            Ok(request) => self.dispatcher.dispatch(request).await,
            Err(failure) => {
                self.stats.decode_failures += 1;
                warn!(
                    sequence = delivery.sequence(),
                    error = %failure.error,
                    salvaged = failure.salvaged.is_some(),
                    "Undecodable request"
                );
                self.dispatcher.decode_failure_response(failure)
            }
        };

        match self.publisher.publish(&response).await {
            Ok(_) => {
                self.stats.published += 1;
                if self.commit_policy == CommitPolicy::AfterPublish {
                    self.commit(&mut delivery).await;
                }
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                error!(
                    sequence = delivery.sequence(),
                    correlation_id = ?response.correlation_id.as_ref().map(|id| id.as_str()),
                    error = %e,
                    "Response dropped"
                );
            }
        }
    }

    async fn commit(&mut self, delivery: &mut Delivery) {
        if let Err(e) = delivery.commit().await {
            self.stats.commit_failures += 1;
            warn!(sequence = delivery.sequence(), error = %e, "Commit failed");
        }
    }
}

/// Resolves once the flag is `true` or every sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
