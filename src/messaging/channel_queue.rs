//! Channel-as-queue adapter.
//!
//! Publishing posts the artifact to a relay channel through the applicant
//! transport. The reviewer bot sees the same post as a `channel_post` update,
//! which its ingestion loop publishes on the bus; subscribing filters those
//! posts back into [`VerificationEvent`]s.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::caption::parse_actor_id;
use super::errors::{QueueError, QueueResult};
use super::{VerificationHandler, VerificationQueue};
use crate::constants::topics;
use crate::events::{event_handler, BusEvent, EventBus, EventHandlerError};
use crate::logging::log_queue_operation;
use crate::models::{SendPhotoParams, VerificationEvent};
use crate::transport::{ChatTransport, RawUpdate};

pub struct ChannelQueue {
    transport: Arc<dyn ChatTransport>,
    channel_id: i64,
    bus: Arc<dyn EventBus>,
}

impl std::fmt::Debug for ChannelQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelQueue")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl ChannelQueue {
    /// `transport` must be the producer-side bot, which can post into `channel_id`
    pub fn new(transport: Arc<dyn ChatTransport>, channel_id: i64, bus: Arc<dyn EventBus>) -> Self {
        Self {
            transport,
            channel_id,
            bus,
        }
    }

    pub fn channel_id(&self) -> i64 {
        self.channel_id
    }
}

/// Turn a relay-channel post into a verification event, if it is one of ours
fn extract_event(update: &RawUpdate, channel_id: i64) -> Option<VerificationEvent> {
    let post = update.channel_post.as_ref()?;

    if post.chat.id != channel_id {
        debug!(chat_id = post.chat.id, "Ignoring post from unmonitored channel");
        return None;
    }

    let Some(photo) = post.largest_photo() else {
        warn!(message_id = post.message_id, "Received non-photo post in relay channel");
        return None;
    };

    let caption = post.caption.clone().unwrap_or_default();
    match parse_actor_id(&caption) {
        Ok(actor_id) => Some(VerificationEvent::new(actor_id, photo.file_id.clone(), caption)),
        Err(err) => {
            error!(
                message_id = post.message_id,
                error = %err,
                "Failed to parse actor id from relay caption"
            );
            None
        }
    }
}

#[async_trait]
impl VerificationQueue for ChannelQueue {
    async fn publish(&self, event: &VerificationEvent) -> QueueResult<String> {
        let params = SendPhotoParams {
            chat_id: self.channel_id,
            file_id: event.artifact_ref.clone(),
            caption: event.caption.clone(),
            parse_mode: None,
            reply_markup: None,
        };

        let message_id = self.transport.send_photo(params).await.map_err(|err| {
            log_queue_operation("publish", Some(&event.actor_id), "failed", Some(&err.to_string()));
            QueueError::publish(format!("channel:{}", self.channel_id), err.to_string())
        })?;

        let storage_ref = message_id.to_string();
        log_queue_operation("publish", Some(&event.actor_id), "published", Some(&storage_ref));
        Ok(storage_ref)
    }

    fn subscribe(&self, handler: Arc<dyn VerificationHandler>) -> QueueResult<()> {
        let channel_id = self.channel_id;

        let bus_handler = event_handler(move |event: BusEvent| {
            let handler = Arc::clone(&handler);
            async move {
                let Some(update) = event.payload.as_update() else {
                    error!(topic = %event.topic, "Received bad channel_post event from bus");
                    return Ok(());
                };
                let Some(verification) = extract_event(update, channel_id) else {
                    return Ok(());
                };

                let actor_id = verification.actor_id;
                info!(actor_id = %actor_id, "Received verification event from queue");
                log_queue_operation("deliver", Some(&actor_id), "received", None);

                handler
                    .handle_verification(verification)
                    .await
                    .map_err(|err| EventHandlerError::execution_failed(&event.topic, err.to_string()))
            }
        });

        self.bus
            .subscribe(topics::REVIEWER_CHANNEL_POST, bus_handler)
            .map_err(|err| QueueError::subscribe(format!("channel:{channel_id}"), err.to_string()))?;

        info!(
            channel_id = channel_id,
            topic = topics::REVIEWER_CHANNEL_POST,
            "Verification queue subscribed"
        );
        Ok(())
    }
}
