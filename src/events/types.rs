use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Actor;
use crate::transport::RawUpdate;

/// Payloads carried on the bus
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A raw inbound update, fanned out by an ingestion loop
    Update(Box<RawUpdate>),
    /// An actor snapshot, published on review decisions
    Actor(Box<Actor>),
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Update(_) => "update",
            EventPayload::Actor(_) => "actor",
        }
    }

    pub fn as_update(&self) -> Option<&RawUpdate> {
        match self {
            EventPayload::Update(update) => Some(update),
            EventPayload::Actor(_) => None,
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            EventPayload::Actor(actor) => Some(actor),
            EventPayload::Update(_) => None,
        }
    }
}

impl From<RawUpdate> for EventPayload {
    fn from(update: RawUpdate) -> Self {
        EventPayload::Update(Box::new(update))
    }
}

impl From<Actor> for EventPayload {
    fn from(actor: Actor) -> Self {
        EventPayload::Actor(Box::new(actor))
    }
}

/// One delivery to one subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    pub event_id: Uuid,
    pub topic: String,
    pub payload: EventPayload,
    pub published_at: DateTime<Utc>,
}

impl BusEvent {
    pub fn new(topic: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            topic: topic.into(),
            payload,
            published_at: Utc::now(),
        }
    }
}

/// Event handler function type
///
/// Handlers are invoked on their own task; the returned future must be
/// `'static` and must not borrow from the publisher.
pub type EventHandler =
    Arc<dyn Fn(BusEvent) -> BoxFuture<'static, Result<(), EventHandlerError>> + Send + Sync>;

/// Errors that can occur during bus operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventBusError {
    #[error("Invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("Event bus is shut down")]
    ShutDown,
}

/// Errors reported by subscribers; logged by the bus, never propagated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventHandlerError {
    #[error("Handler on topic '{topic}' failed: {reason}")]
    ExecutionFailed { topic: String, reason: String },

    #[error("Handler on topic '{topic}' received an unexpected {received} payload")]
    UnexpectedPayload { topic: String, received: String },

    #[error("Handler on topic '{topic}' panicked")]
    HandlerPanicked { topic: String },
}

impl EventHandlerError {
    pub fn execution_failed(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected_payload(topic: impl Into<String>, payload: &EventPayload) -> Self {
        Self::UnexpectedPayload {
            topic: topic.into(),
            received: payload.kind().to_string(),
        }
    }
}

/// Wrap an async closure as an [`EventHandler`]
///
/// ```rust
/// use relay_core::events::{event_handler, BusEvent};
///
/// let handler = event_handler(|event: BusEvent| async move {
///     tracing::info!(topic = %event.topic, "received");
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn event_handler<F, Fut>(f: F) -> EventHandler
where
    F: Fn(BusEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), EventHandlerError>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}
