//! Applicant notifications for review decisions.
//!
//! Not a routed handler: a bus subscriber on the decision topics that
//! messages the applicant through the applicant-facing transport.

use std::sync::Arc;
use tracing::{error, info};

use super::prompts;
use crate::constants::topics;
use crate::events::{event_handler, BusEvent, EventBus, EventBusError, EventHandlerError};
use crate::transport::ChatTransport;

/// Subscribe approval and rejection notices on `bus`
pub fn subscribe_notifications(
    bus: &dyn EventBus,
    transport: Arc<dyn ChatTransport>,
) -> Result<(), EventBusError> {
    for (topic, text) in [
        (topics::ACTOR_APPROVED, prompts::APPROVED_NOTICE),
        (topics::ACTOR_REJECTED, prompts::REJECTED_NOTICE),
    ] {
        let transport = transport.clone();
        bus.subscribe(
            topic,
            event_handler(move |event: BusEvent| {
                let transport = transport.clone();
                async move { notify(transport.as_ref(), event, text).await }
            }),
        )?;
    }
    Ok(())
}

async fn notify(
    transport: &dyn ChatTransport,
    event: BusEvent,
    text: &str,
) -> Result<(), EventHandlerError> {
    let Some(actor) = event.payload.as_actor() else {
        error!(topic = %event.topic, "Notification received a non-actor payload");
        return Err(EventHandlerError::unexpected_payload(event.topic, &event.payload));
    };

    info!(actor_id = %actor.id, topic = %event.topic, "Sending review outcome to applicant");
    transport
        .send_message(prompts::markdown(actor.handle, text))
        .await
        .map_err(|e| EventHandlerError::execution_failed(&event.topic, e.to_string()))?;
    Ok(())
}
