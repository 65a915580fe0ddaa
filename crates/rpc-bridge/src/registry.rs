//! # Action Registry
//!
//! Immutable mapping from request-type tag to handler, built once at start-up
//! and shared read-only by every listener.

use crate::domain::action::ActionKind;
use crate::domain::error::HandlerFault;
use crate::handlers;
use bridge_types::{Payload, ResponseEnvelope};
use identity_store::IdentityStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handler contract: action payload and store in, response shape out.
///
/// Handlers never see or set correlation ids.
pub type Handler = Arc<
    dyn Fn(Payload, &dyn IdentityStore) -> Result<ResponseEnvelope, HandlerFault> + Send + Sync,
>;

/// Read-only tag → handler table.
#[derive(Clone)]
pub struct ActionRegistry {
    handlers: HashMap<String, Handler>,
}

impl ActionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the seven identity actions.
    pub fn standard() -> Self {
        Self::builder().with_standard_actions().build()
    }

    /// Handler for `tag`, if registered.
    pub fn resolve(&self, tag: &str) -> Option<Handler> {
        self.handlers.get(tag).cloned()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Accumulates handlers; the registry is frozen by [`build`](Self::build).
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Handler>,
}

impl RegistryBuilder {
    /// Register the seven identity actions.
    #[must_use]
    pub fn with_standard_actions(self) -> Self {
        ActionKind::ALL.into_iter().fold(self, |builder, kind| {
            builder.register_arc(kind.tag(), handlers::handler_for(kind))
        })
    }

    /// Register `handler` under `tag`, replacing any earlier registration.
    #[must_use]
    pub fn register<F>(self, tag: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Payload, &dyn IdentityStore) -> Result<ResponseEnvelope, HandlerFault>
            + Send
            + Sync
            + 'static,
    {
        self.register_arc(tag, Arc::new(handler))
    }

    #[must_use]
    pub fn register_arc(mut self, tag: impl Into<String>, handler: Handler) -> Self {
        self.handlers.insert(tag.into(), handler);
        self
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity_store::InMemoryIdentityStore;

    #[test]
    fn test_standard_registry_covers_every_action() {
        let registry = ActionRegistry::standard();
        assert_eq!(registry.len(), ActionKind::ALL.len());
        for kind in ActionKind::ALL {
            assert!(registry.resolve(kind.tag()).is_some(), "{kind} missing");
        }
        assert!(registry.resolve("DELETE_USER").is_none());
    }

    #[test]
    fn test_substitute_registry() {
        let registry = ActionRegistry::builder()
            .register("PING", |_, _| Ok(ResponseEnvelope::ok("pong")))
            .build();
        let store = InMemoryIdentityStore::new();

        let handler = registry.resolve("PING").unwrap();
        let response = handler(Payload::new(), &store).unwrap();
        assert_eq!(response.msg, "pong");
        assert_eq!(registry.tags(), vec!["PING"]);
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = ActionRegistry::builder()
            .register("X", |_, _| Ok(ResponseEnvelope::ok("first")))
            .register("X", |_, _| Ok(ResponseEnvelope::ok("second")))
            .build();
        let store = InMemoryIdentityStore::new();

        let response = registry.resolve("X").unwrap()(Payload::new(), &store).unwrap();
        assert_eq!(response.msg, "second");
        assert_eq!(registry.len(), 1);
    }
}
