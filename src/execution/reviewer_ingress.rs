//! Reviewer-side fan-out.
//!
//! The reviewer bot sees both relay-channel posts and reviewer traffic. Its
//! worker pool does not route directly: every raw update is published on a
//! per-kind bus topic, and the reviewer router and the verification queue
//! subscribe to the topics they care about.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::router::{DispatchOutcome, Router, UpdateProcessor};
use crate::constants::topics;
use crate::events::{event_handler, BusEvent, EventBus, EventBusError, EventHandlerError};
use crate::transport::RawUpdate;

/// Bus topic for a raw reviewer-bot update
pub fn topic_for(update: &RawUpdate) -> Option<&'static str> {
    if update.callback_query.is_some() {
        Some(topics::REVIEWER_CALLBACK_QUERY)
    } else if update.message.is_some() {
        Some(topics::REVIEWER_MESSAGE)
    } else if update.channel_post.is_some() {
        Some(topics::REVIEWER_CHANNEL_POST)
    } else {
        None
    }
}

/// [`UpdateProcessor`] that republishes raw updates on the bus
pub struct BusPublisher {
    bus: Arc<dyn EventBus>,
}

impl std::fmt::Debug for BusPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusPublisher").finish_non_exhaustive()
    }
}

impl BusPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl UpdateProcessor for BusPublisher {
    async fn process(&self, update: RawUpdate) -> DispatchOutcome {
        let Some(topic) = topic_for(&update) else {
            debug!(update_id = update.update_id, "Reviewer update has no known payload");
            return DispatchOutcome::Unsupported;
        };
        let deliveries = self.bus.publish(topic, update.into());
        DispatchOutcome::Published {
            topic: topic.to_string(),
            deliveries,
        }
    }
}

/// Feed reviewer messages and button presses from the bus into `router`
pub fn subscribe_router(bus: &dyn EventBus, router: Arc<Router>) -> Result<(), EventBusError> {
    for topic in [topics::REVIEWER_MESSAGE, topics::REVIEWER_CALLBACK_QUERY] {
        let router = router.clone();
        bus.subscribe(
            topic,
            event_handler(move |event: BusEvent| {
                let router = router.clone();
                async move {
                    let Some(update) = event.payload.as_update().cloned() else {
                        return Err(EventHandlerError::unexpected_payload(
                            event.topic,
                            &event.payload,
                        ));
                    };
                    router.process(update).await;
                    Ok(())
                }
            }),
        )?;
    }
    Ok(())
}
