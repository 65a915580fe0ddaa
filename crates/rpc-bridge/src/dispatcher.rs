//! # Dispatcher
//!
//! Turns one decoded request into exactly one response.
//!
//! ## Steps
//!
//! 1. Capture `type` and `correlationId`.
//! 2. Resolve the handler; unknown or missing tags get `400 unsupported action`.
//! 3. Run the handler on the blocking pool. Faults, panics and a missed
//!    deadline all become 500.
//! 4. Re-stamp the captured correlation id onto whatever came back.
//!
//! Step 4 is the only place correlation ids are written: handlers are not
//! trusted to preserve them.

use crate::domain::action::ActionKind;
use crate::domain::config::FaultDetail;
use crate::registry::ActionRegistry;
use bridge_types::{CorrelationId, DecodeFailure, Payload, RequestEnvelope, ResponseEnvelope};
use identity_store::IdentityStore;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

pub const MSG_UNSUPPORTED: &str = "unsupported action";
pub const MSG_DEADLINE: &str = "request deadline exceeded";
pub const MSG_REDACTED: &str = "internal error";

pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    store: Arc<dyn IdentityStore>,
    deadline: Option<Duration>,
    fault_detail: FaultDetail,
}

impl Dispatcher {
    pub fn new(registry: Arc<ActionRegistry>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            registry,
            store,
            deadline: None,
            fault_detail: FaultDetail::default(),
        }
    }

    /// Bound each handler run. On expiry the caller gets a 500 while the
    /// handler thread is left to finish on its own.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_fault_detail(mut self, fault_detail: FaultDetail) -> Self {
        self.fault_detail = fault_detail;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Dispatch one request. Never fails.
    pub async fn dispatch(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let RequestEnvelope {
            action,
            correlation_id,
            payload,
        } = request;

        let response = self
            .respond(action.as_deref(), correlation_id.as_ref(), payload)
            .await;

        debug!(
            action = action.as_deref().unwrap_or("-"),
            correlation_id = ?correlation_id.as_ref().map(CorrelationId::as_str),
            status = response.status.code(),
            "Request dispatched"
        );
        response.stamp(correlation_id)
    }

    /// 500 answer for bytes that never became a request.
    pub fn decode_failure_response(&self, failure: DecodeFailure) -> ResponseEnvelope {
        let msg = match self.fault_detail {
            FaultDetail::Verbose => format!("malformed request: {}", failure.error),
            FaultDetail::Redacted => "malformed request".to_string(),
        };
        ResponseEnvelope::internal(msg).stamp(failure.salvaged)
    }

    async fn respond(
        &self,
        action: Option<&str>,
        correlation_id: Option<&CorrelationId>,
        payload: Payload,
    ) -> ResponseEnvelope {
        let Some(handler) = action.and_then(|tag| self.registry.resolve(tag)) else {
            warn!(
                action = action.unwrap_or("-"),
                standard = action.and_then(ActionKind::from_tag).is_some(),
                correlation_id = ?correlation_id.map(CorrelationId::as_str),
                "Unsupported action"
            );
            return ResponseEnvelope::bad_request(MSG_UNSUPPORTED);
        };

        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || handler(payload, store.as_ref()));

        let joined = match self.deadline {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    error!(
                        action = action.unwrap_or("-"),
                        deadline_ms = limit.as_millis() as u64,
                        "Dispatch deadline exceeded"
                    );
                    return ResponseEnvelope::internal(MSG_DEADLINE);
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => {
                error!(action = action.unwrap_or("-"), %fault, "Handler fault");
                self.fault_response(fault.to_string())
            }
            Err(join_error) => {
                let text = join_failure_text(join_error);
                error!(action = action.unwrap_or("-"), panic = %text, "Handler panicked");
                self.fault_response(text)
            }
        }
    }

    fn fault_response(&self, text: String) -> ResponseEnvelope {
        match self.fault_detail {
            FaultDetail::Verbose => ResponseEnvelope::internal(text),
            FaultDetail::Redacted => ResponseEnvelope::internal(MSG_REDACTED),
        }
    }
}

fn join_failure_text(join_error: JoinError) -> String {
    if join_error.is_panic() {
        panic_text(join_error.into_panic())
    } else {
        "handler cancelled".to_string()
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(text) => format!("handler panicked: {text}"),
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(text) => format!("handler panicked: {text}"),
            Err(_) => "handler panicked".to_string(),
        },
    }
}
