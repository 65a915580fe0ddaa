//! # Outbound Publisher
//!
//! Serializes a response and publishes it to the response topic, returning
//! only once the broker acknowledged the write. The listener awaits this
//! before pulling the next request, which bounds each listener to one
//! request in flight.

use crate::domain::config::RetryPolicy;
use crate::domain::error::BridgeError;
use bridge_bus::{PublishAck, ResponseSink};
use bridge_types::ResponseEnvelope;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct OutboundPublisher {
    sink: Arc<dyn ResponseSink>,
    topic: String,
    retry: RetryPolicy,
}

impl OutboundPublisher {
    pub fn new(sink: Arc<dyn ResponseSink>, topic: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            sink,
            topic: topic.into(),
            retry,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish `response`, retrying with exponential backoff.
    pub async fn publish(&self, response: &ResponseEnvelope) -> Result<PublishAck, BridgeError> {
        let bytes = response.encode()?;
        let attempts = self.retry.attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.sink.publish(&self.topic, bytes.clone()).await {
                Ok(ack) => {
                    debug!(
                        topic = %ack.topic,
                        sequence = ack.sequence,
                        status = response.status.code(),
                        attempt,
                        "Response published"
                    );
                    return Ok(ack);
                }
                Err(last) if attempt >= attempts => {
                    return Err(BridgeError::PublishExhausted { attempts, last });
                }
                Err(e) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        topic = %self.topic,
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Publish failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_bus::{BusError, InMemoryBroker};
    use std::time::Duration;

    fn retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_publish_writes_encoded_envelope() {
        let broker = InMemoryBroker::new();
        let publisher = OutboundPublisher::new(Arc::new(broker.clone()), "out", retry(1));

        let response = ResponseEnvelope::ok("fine").stamp(Some("c1".into()));
        let ack = publisher.publish(&response).await.unwrap();

        assert_eq!(ack.sequence, 0);
        let written = ResponseEnvelope::decode(&broker.messages("out")[0]).unwrap();
        assert_eq!(written, response);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let broker = InMemoryBroker::new();
        broker.fail_next_publishes(2);
        let publisher = OutboundPublisher::new(Arc::new(broker.clone()), "out", retry(3));

        publisher
            .publish(&ResponseEnvelope::ok("fine"))
            .await
            .unwrap();
        assert_eq!(broker.messages("out").len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let broker = InMemoryBroker::new();
        broker.fail_next_publishes(5);
        let publisher = OutboundPublisher::new(Arc::new(broker.clone()), "out", retry(2));

        let err = publisher
            .publish(&ResponseEnvelope::ok("fine"))
            .await
            .unwrap_err();
        match err {
            BridgeError::PublishExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(last, BusError::Publish(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(broker.messages("out").is_empty());
    }
}
