//! Bridge configuration with validation.

use crate::domain::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Broker redelivery floor; also the JetStream server default.
pub const MIN_ACK_WAIT: Duration = Duration::from_secs(30);

/// Handling time assumed when no dispatch deadline is set.
const UNBOUNDED_DISPATCH_ALLOWANCE: Duration = Duration::from_secs(30);

const ACK_WAIT_MARGIN: Duration = Duration::from_secs(5);

/// Main bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Topic requests are consumed from
    pub request_topic: String,
    /// Topic responses are published to
    pub response_topic: String,
    /// Consumer group shared by every listener of the deployment
    pub group: String,
    /// When the group offset advances past a request
    pub commit_policy: CommitPolicy,
    /// Per-dispatch deadline; `None` waits for the handler indefinitely
    pub dispatch_deadline: Option<Duration>,
    /// How much fault text reaches the caller
    pub fault_detail: FaultDetail,
    /// Publish retry behaviour
    pub retry: RetryPolicy,
    /// Sequential listener instances in this process
    pub listeners: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_topic: "auth-request".into(),
            response_topic: "auth-response".into(),
            group: "auth-bridge-group-development".into(),
            commit_policy: CommitPolicy::default(),
            dispatch_deadline: None,
            fault_detail: FaultDetail::default(),
            retry: RetryPolicy::default(),
            listeners: 1,
        }
    }
}

impl BridgeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.request_topic.trim().is_empty() || self.response_topic.trim().is_empty() {
            return Err(BridgeError::InvalidConfig("topics cannot be empty".into()));
        }

        if self.request_topic == self.response_topic {
            return Err(BridgeError::InvalidConfig(
                "request and response topics must differ".into(),
            ));
        }

        if self.group.trim().is_empty() {
            return Err(BridgeError::InvalidConfig(
                "consumer group cannot be empty".into(),
            ));
        }

        if self.listeners == 0 {
            return Err(BridgeError::InvalidConfig("listeners cannot be 0".into()));
        }

        if self.retry.attempts == 0 {
            return Err(BridgeError::InvalidConfig(
                "publish attempts cannot be 0".into(),
            ));
        }

        if self.dispatch_deadline.is_some_and(|d| d.is_zero()) {
            return Err(BridgeError::InvalidConfig(
                "dispatch deadline cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// How long the broker should wait for a commit before redelivering.
    ///
    /// Covers the dispatch deadline plus every publish backoff. Without a
    /// deadline a handler may outlast this window, and under
    /// [`CommitPolicy::AfterPublish`] its request is then handed to another
    /// group member while the first one is still working on it.
    pub fn ack_wait(&self) -> Duration {
        let handling = self
            .dispatch_deadline
            .unwrap_or(UNBOUNDED_DISPATCH_ALLOWANCE);
        let backoff = (1..self.retry.attempts)
            .map(|attempt| self.retry.backoff(attempt))
            .fold(Duration::ZERO, Duration::saturating_add);

        handling
            .saturating_add(backoff)
            .saturating_add(ACK_WAIT_MARGIN)
            .max(MIN_ACK_WAIT)
    }
}

/// Offset commit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Commit as soon as a request is received. A crash before the response
    /// is published loses the request.
    #[default]
    OnReceipt,
    /// Commit only after the response was acknowledged. A crash before that
    /// redelivers the request, so handlers may run twice.
    AfterPublish,
}

impl CommitPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            CommitPolicy::OnReceipt => "on-receipt",
            CommitPolicy::AfterPublish => "after-publish",
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-receipt" => Ok(CommitPolicy::OnReceipt),
            "after-publish" => Ok(CommitPolicy::AfterPublish),
            other => Err(format!(
                "unknown commit policy '{other}' (expected on-receipt or after-publish)"
            )),
        }
    }
}

/// Fault text exposure in 500 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultDetail {
    /// `msg` carries the fault's own text.
    #[default]
    Verbose,
    /// `msg` is always `internal error`.
    Redacted,
}

impl FromStr for FaultDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verbose" => Ok(FaultDetail::Verbose),
            "redacted" => Ok(FaultDetail::Redacted),
            other => Err(format!(
                "unknown fault detail '{other}' (expected verbose or redacted)"
            )),
        }
    }
}

/// Publish retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay after the first failure; doubles after each further failure
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1u32 << exponent)
    }
}
