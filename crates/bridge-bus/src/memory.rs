//! # In-Memory Broker
//!
//! Append-only topic logs with per-group cursors, modelled on a partitioned
//! log broker with a single partition per topic.
//!
//! ## Group Semantics
//!
//! - Each group keeps a **cursor** (next message to hand out) and a
//!   **committed offset** (first message not yet committed).
//! - Messages are committed individually. The committed offset only advances
//!   across a contiguous run of committed messages, so a message left
//!   uncommitted holds it back even when later messages are committed.
//! - Members of the same group share the cursor, so a message reaches exactly
//!   one member.
//! - New groups start at the beginning of the log.
//! - [`InMemoryBroker::rewind_to_committed`] simulates a member crash followed
//!   by a rebalance: uncommitted messages are handed out again, and messages
//!   committed past a gap are skipped.

use crate::errors::BusError;
use crate::publisher::{PublishAck, ResponseSink};
use crate::subscriber::{CommitHandle, Delivery, RequestConsumer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct GroupCursor {
    next: usize,
    committed: usize,
    /// Committed offsets beyond `committed`, waiting for the gap to close.
    ahead: BTreeSet<usize>,
}

impl GroupCursor {
    fn commit(&mut self, offset: usize) {
        if offset < self.committed {
            return;
        }
        self.ahead.insert(offset);
        while self.ahead.remove(&self.committed) {
            self.committed += 1;
        }
    }

    fn skip_committed(&mut self) {
        while self.next < self.committed || self.ahead.contains(&self.next) {
            self.next += 1;
        }
    }
}

#[derive(Debug, Default)]
struct TopicLog {
    messages: Vec<Vec<u8>>,
    groups: HashMap<String, GroupCursor>,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, TopicLog>,
    closed: bool,
    /// Number of upcoming publishes to reject.
    injected_failures: usize,
}

struct Inner {
    state: Mutex<BrokerState>,
    /// Bumped on every append and on close; consumers wait on it.
    version: watch::Sender<u64>,
}

enum Take {
    Message(Delivery),
    Empty,
    Closed,
}

/// In-memory implementation of the broker.
///
/// Cheap to clone; clones share the same logs.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BrokerState::default()),
                version,
            }),
        }
    }

    /// Join `group` on `topic`.
    #[must_use]
    pub fn consumer(&self, topic: &str, group: &str) -> InMemoryConsumer {
        {
            let mut state = self.inner.state.lock();
            state
                .topics
                .entry(topic.to_string())
                .or_default()
                .groups
                .entry(group.to_string())
                .or_default();
        }
        debug!(topic, group, "Consumer joined group");

        InMemoryConsumer {
            broker: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            changes: self.inner.version.subscribe(),
        }
    }

    /// Append a message without going through the acknowledgment path.
    ///
    /// Returns the sequence of the appended message.
    pub fn append(&self, topic: &str, payload: Vec<u8>) -> u64 {
        let sequence = {
            let mut state = self.inner.state.lock();
            let log = state.topics.entry(topic.to_string()).or_default();
            log.messages.push(payload);
            (log.messages.len() - 1) as u64
        };
        self.inner.version.send_modify(|v| *v += 1);
        sequence
    }

    /// Snapshot of every message ever appended to `topic`.
    pub fn messages(&self, topic: &str) -> Vec<Vec<u8>> {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }

    /// First offset of `topic` not yet committed by `group`.
    pub fn committed_offset(&self, topic: &str, group: &str) -> usize {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .and_then(|log| log.groups.get(group))
            .map(|cursor| cursor.committed)
            .unwrap_or(0)
    }

    /// Move the group cursor back to its committed offset.
    pub fn rewind_to_committed(&self, topic: &str, group: &str) {
        let mut state = self.inner.state.lock();
        if let Some(cursor) = state
            .topics
            .get_mut(topic)
            .and_then(|log| log.groups.get_mut(group))
        {
            debug!(
                topic,
                group,
                from = cursor.next,
                to = cursor.committed,
                "Group rewound to committed offset"
            );
            cursor.next = cursor.committed;
        }
    }

    /// Reject the next `count` publishes with [`BusError::Publish`].
    pub fn fail_next_publishes(&self, count: usize) {
        self.inner.state.lock().injected_failures = count;
    }

    /// Shut the broker down; waiting consumers return `Ok(None)`.
    pub fn close(&self) {
        self.inner.state.lock().closed = true;
        self.inner.version.send_modify(|v| *v += 1);
    }

    fn take_next(&self, topic: &str, group: &str) -> Take {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Take::Closed;
        }

        let log = state.topics.entry(topic.to_string()).or_default();
        let cursor = log.groups.entry(group.to_string()).or_default();
        cursor.skip_committed();
        let offset = cursor.next;
        let Some(message) = log.messages.get(offset) else {
            return Take::Empty;
        };
        cursor.next += 1;

        let commit = InMemoryCommit {
            broker: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            offset,
        };
        Take::Message(Delivery::new(
            message.clone(),
            offset as u64,
            Box::new(commit),
        ))
    }

    fn commit_offset(&self, topic: &str, group: &str, offset: usize) {
        let mut state = self.inner.state.lock();
        if let Some(cursor) = state
            .topics
            .get_mut(topic)
            .and_then(|log| log.groups.get_mut(group))
        {
            cursor.commit(offset);
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSink for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<PublishAck, BusError> {
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(BusError::Closed);
            }
            if state.injected_failures > 0 {
                state.injected_failures -= 1;
                warn!(topic, "Publish rejected (injected failure)");
                return Err(BusError::Publish("injected failure".into()));
            }
        }

        let sequence = self.append(topic, payload);
        Ok(PublishAck {
            topic: topic.to_string(),
            sequence,
        })
    }
}

struct InMemoryCommit {
    broker: InMemoryBroker,
    topic: String,
    group: String,
    offset: usize,
}

#[async_trait]
impl CommitHandle for InMemoryCommit {
    async fn commit(self: Box<Self>) -> Result<(), BusError> {
        self.broker
            .commit_offset(&self.topic, &self.group, self.offset);
        Ok(())
    }
}

/// One member of a consumer group on an [`InMemoryBroker`] topic.
pub struct InMemoryConsumer {
    broker: InMemoryBroker,
    topic: String,
    group: String,
    changes: watch::Receiver<u64>,
}

impl InMemoryConsumer {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[async_trait]
impl RequestConsumer for InMemoryConsumer {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BusError> {
        loop {
            // Mark the current version seen before looking, so an append that
            // races with the check still wakes us.
            self.changes.borrow_and_update();

            match self.broker.take_next(&self.topic, &self.group) {
                Take::Message(delivery) => return Ok(Some(delivery)),
                Take::Closed => return Ok(None),
                Take::Empty => {}
            }

            if self.changes.changed().await.is_err() {
                return Ok(None);
            }
        }
    }
}
