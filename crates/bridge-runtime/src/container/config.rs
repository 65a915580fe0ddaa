//! # Runtime Configuration
//!
//! Read once from the environment at start-up.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BRIDGE_BROKER_URL` | required |
//! | `BRIDGE_ENVIRONMENT` | `development` |
//! | `BRIDGE_GROUP_PREFIX` | `auth-bridge-group` |
//! | `BRIDGE_REQUEST_TOPIC` | `auth-request` |
//! | `BRIDGE_RESPONSE_TOPIC` | `auth-response` |
//! | `BRIDGE_COMMIT_POLICY` | `on-receipt` |
//! | `BRIDGE_DISPATCH_DEADLINE_MS` | unset |
//! | `BRIDGE_FAULT_DETAIL` | `verbose` |
//! | `BRIDGE_PUBLISH_ATTEMPTS` | `3` |
//! | `BRIDGE_PUBLISH_BACKOFF_MS` | `100` |
//! | `BRIDGE_LISTENERS` | `1` |
//! | `BRIDGE_ADMIN_SEED` | unset (`username:email:password`) |
//! | `BRIDGE_LOG_FORMAT` | `text` |
//!
//! Blank values count as unset. The consumer group is
//! `<prefix>-<environment>`.

use rpc_bridge::{BridgeConfig, BridgeError};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_BROKER_URL: &str = "BRIDGE_BROKER_URL";
pub const ENV_ENVIRONMENT: &str = "BRIDGE_ENVIRONMENT";
pub const ENV_GROUP_PREFIX: &str = "BRIDGE_GROUP_PREFIX";
pub const ENV_REQUEST_TOPIC: &str = "BRIDGE_REQUEST_TOPIC";
pub const ENV_RESPONSE_TOPIC: &str = "BRIDGE_RESPONSE_TOPIC";
pub const ENV_COMMIT_POLICY: &str = "BRIDGE_COMMIT_POLICY";
pub const ENV_DISPATCH_DEADLINE_MS: &str = "BRIDGE_DISPATCH_DEADLINE_MS";
pub const ENV_FAULT_DETAIL: &str = "BRIDGE_FAULT_DETAIL";
pub const ENV_PUBLISH_ATTEMPTS: &str = "BRIDGE_PUBLISH_ATTEMPTS";
pub const ENV_PUBLISH_BACKOFF_MS: &str = "BRIDGE_PUBLISH_BACKOFF_MS";
pub const ENV_LISTENERS: &str = "BRIDGE_LISTENERS";
pub const ENV_ADMIN_SEED: &str = "BRIDGE_ADMIN_SEED";
pub const ENV_LOG_FORMAT: &str = "BRIDGE_LOG_FORMAT";

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Broker endpoint.
    pub broker_url: String,
    /// Deployment environment name.
    pub environment: String,
    /// Consumer group base name.
    pub group_prefix: String,
    /// Bridge settings, with the effective group filled in.
    pub bridge: BridgeConfig,
    /// Administrator created at start-up if absent.
    pub admin_seed: Option<AdminSeed>,
    pub log_format: LogFormat,
    /// Broker connection timeout.
    pub connect_timeout: Duration,
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let broker_url = get(ENV_BROKER_URL).ok_or(ConfigError::MissingBroker)?;
        let environment = get(ENV_ENVIRONMENT).unwrap_or_else(|| "development".into());
        let group_prefix = get(ENV_GROUP_PREFIX).unwrap_or_else(|| "auth-bridge-group".into());

        let mut bridge = BridgeConfig {
            group: format!("{group_prefix}-{environment}"),
            ..BridgeConfig::default()
        };
        if let Some(topic) = get(ENV_REQUEST_TOPIC) {
            bridge.request_topic = topic;
        }
        if let Some(topic) = get(ENV_RESPONSE_TOPIC) {
            bridge.response_topic = topic;
        }
        if let Some(policy) = get(ENV_COMMIT_POLICY) {
            bridge.commit_policy = parse(ENV_COMMIT_POLICY, &policy)?;
        }
        if let Some(ms) = get(ENV_DISPATCH_DEADLINE_MS) {
            bridge.dispatch_deadline = Some(Duration::from_millis(parse(
                ENV_DISPATCH_DEADLINE_MS,
                &ms,
            )?));
        }
        if let Some(detail) = get(ENV_FAULT_DETAIL) {
            bridge.fault_detail = parse(ENV_FAULT_DETAIL, &detail)?;
        }
        if let Some(attempts) = get(ENV_PUBLISH_ATTEMPTS) {
            bridge.retry.attempts = parse(ENV_PUBLISH_ATTEMPTS, &attempts)?;
        }
        if let Some(ms) = get(ENV_PUBLISH_BACKOFF_MS) {
            bridge.retry.base_backoff =
                Duration::from_millis(parse(ENV_PUBLISH_BACKOFF_MS, &ms)?);
        }
        if let Some(listeners) = get(ENV_LISTENERS) {
            bridge.listeners = parse(ENV_LISTENERS, &listeners)?;
        }
        bridge.validate()?;

        let admin_seed = get(ENV_ADMIN_SEED)
            .map(|raw| raw.parse::<AdminSeed>())
            .transpose()?;
        let log_format = match get(ENV_LOG_FORMAT) {
            Some(format) => parse(ENV_LOG_FORMAT, &format)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            broker_url,
            environment,
            group_prefix,
            bridge,
            admin_seed,
            log_format,
            connect_timeout: Duration::from_secs(5),
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Administrator bootstrap account, `username:email:password`.
///
/// The password is everything after the second colon.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl FromStr for AdminSeed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(username), Some(email), Some(password))
                if !username.is_empty() && !email.is_empty() && !password.is_empty() =>
            {
                Ok(Self {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidSeed),
        }
    }
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BRIDGE_BROKER_URL is not set")]
    MissingBroker,

    #[error("{var}={value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("BRIDGE_ADMIN_SEED must be username:email:password with no empty part")]
    InvalidSeed,

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
