//! # JetStream Broker
//!
//! Production adapter over NATS JetStream.
//!
//! | Log broker concept | JetStream mapping                          |
//! |--------------------|--------------------------------------------|
//! | topic              | stream with a single subject of that name  |
//! | consumer group     | durable pull consumer named after the group |
//! | offset commit      | explicit message ack                       |
//! | flushed publish    | awaited publish acknowledgment             |

use crate::errors::BusError;
use crate::publisher::{PublishAck, ResponseSink};
use crate::subscriber::{CommitHandle, Delivery, RequestConsumer};
use async_nats::jetstream::{self, consumer::pull, stream};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

/// Stream name for a topic: uppercase, with every character outside
/// `[A-Za-z0-9]` replaced by `_`.
pub fn stream_name(topic: &str) -> String {
    topic
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `url` without the `user:password@` part of its authority.
pub fn redact_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let rest = match rest[..authority_end].rfind('@') {
        Some(at) => &rest[at + 1..],
        None => rest,
    };
    match scheme {
        Some(scheme) => format!("{scheme}://{rest}"),
        None => rest.to_string(),
    }
}

/// Handle on a JetStream-enabled NATS server.
#[derive(Clone)]
pub struct JetStreamBroker {
    context: jetstream::Context,
}

impl JetStreamBroker {
    /// Connect to `url`, failing after `timeout`. Credentials in `url` never
    /// reach logs or errors.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, BusError> {
        let shown = redact_url(url);
        let client = async_nats::ConnectOptions::new()
            .name("identity-bridge")
            .connection_timeout(timeout)
            .connect(url)
            .await
            .map_err(|e| BusError::Connect(format!("{shown}: {e}")))?;

        info!(url = %shown, "Connected to broker");
        Ok(Self {
            context: jetstream::new(client),
        })
    }

    /// Make sure the stream backing `topic` exists.
    pub async fn ensure_topic(&self, topic: &str) -> Result<(), BusError> {
        let name = stream_name(topic);
        self.context
            .get_or_create_stream(stream::Config {
                name: name.clone(),
                subjects: vec![topic.to_string()],
                retention: stream::RetentionPolicy::Limits,
                storage: stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Topic(format!("{topic}: {e}")))?;

        debug!(topic, stream = %name, "Topic ready");
        Ok(())
    }

    /// Join `group` on `topic`.
    ///
    /// The durable consumer is created on first use; later members attach to
    /// the same consumer and share its messages. A delivery not committed
    /// within `ack_wait` is redelivered to the group. An existing consumer
    /// keeps the `ack_wait` it was created with.
    pub async fn consumer(
        &self,
        topic: &str,
        group: &str,
        ack_wait: Duration,
    ) -> Result<JetStreamConsumer, BusError> {
        let stream = self
            .context
            .get_stream(stream_name(topic))
            .await
            .map_err(|e| BusError::Topic(format!("{topic}: {e}")))?;

        let consumer = stream
            .get_or_create_consumer(
                group,
                pull::Config {
                    durable_name: Some(group.to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    deliver_policy: jetstream::consumer::DeliverPolicy::All,
                    filter_subject: topic.to_string(),
                    ack_wait,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Topic(format!("consumer {group}: {e}")))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::Receive(e.to_string()))?
            .map(|item| item.map_err(|e| BusError::Receive(e.to_string())))
            .boxed();

        info!(
            topic,
            group,
            ack_wait_ms = ack_wait.as_millis() as u64,
            "Joined consumer group"
        );
        Ok(JetStreamConsumer { messages })
    }
}

#[async_trait]
impl ResponseSink for JetStreamBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<PublishAck, BusError> {
        let ack = self
            .context
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;

        Ok(PublishAck {
            topic: topic.to_string(),
            sequence: ack.sequence,
        })
    }
}

/// One member of a durable JetStream consumer.
pub struct JetStreamConsumer {
    messages: BoxStream<'static, Result<jetstream::Message, BusError>>,
}

#[async_trait]
impl RequestConsumer for JetStreamConsumer {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BusError> {
        let Some(item) = self.messages.next().await else {
            return Ok(None);
        };
        let message = item?;

        let sequence = message
            .info()
            .map(|info| info.stream_sequence)
            .unwrap_or_default();
        let payload = message.payload.to_vec();

        Ok(Some(Delivery::new(
            payload,
            sequence,
            Box::new(JetStreamCommit { message }),
        )))
    }
}

struct JetStreamCommit {
    message: jetstream::Message,
}

#[async_trait]
impl CommitHandle for JetStreamCommit {
    async fn commit(self: Box<Self>) -> Result<(), BusError> {
        self.message
            .ack()
            .await
            .map_err(|e| BusError::Commit(e.to_string()))
    }
}
