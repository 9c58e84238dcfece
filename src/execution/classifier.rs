//! Update classification.
//!
//! Pure mapping from a raw transport update to a [`CanonicalEvent`].
//! Precedence: button press, then a text command, then free-form content
//! (text, shared contact, photo). `None` means the shape is unsupported.

use tracing::warn;

use crate::models::{CanonicalEvent, EventKind, MessageContent, PhotoAttachment, SharedContact};
use crate::transport::types::{CallbackQuery, Message};
use crate::transport::RawUpdate;

pub fn classify(update: &RawUpdate) -> Option<CanonicalEvent> {
    let classified = if let Some(callback) = &update.callback_query {
        classify_callback(callback)
    } else if let Some(message) = &update.message {
        classify_message(message)
    } else {
        None
    };

    if classified.is_none() {
        warn!(
            update_id = update.update_id,
            update_kind = update.kind(),
            "Unsupported update shape; dropping"
        );
    }
    classified
}

fn classify_callback(callback: &CallbackQuery) -> Option<CanonicalEvent> {
    let data = callback.data.clone()?;
    let (chat_id, message_id) = callback
        .message
        .as_ref()
        .map(|message| (message.chat.id, message.message_id))
        .unwrap_or((callback.from.id, 0));

    Some(CanonicalEvent {
        actor_handle: callback.from.id,
        chat_id,
        message_id,
        kind: EventKind::Callback {
            query_id: callback.id.clone(),
            data,
        },
    })
}

fn classify_message(message: &Message) -> Option<CanonicalEvent> {
    let sender = message.from.as_ref()?;

    let kind = if let Some((name, arguments)) = message.command() {
        EventKind::Command { name, arguments }
    } else {
        let content = MessageContent {
            text: message.text.clone(),
            contact: message.contact.as_ref().map(|contact| SharedContact {
                phone_number: contact.phone_number.clone(),
                owner_handle: contact.user_id,
            }),
            photo: message.largest_photo().map(|photo| PhotoAttachment {
                file_id: photo.file_id.clone(),
                file_size: photo.file_size,
            }),
        };
        if content.is_empty() {
            return None;
        }
        EventKind::Content(content)
    };

    Some(CanonicalEvent {
        actor_handle: sender.id,
        chat_id: message.chat.id,
        message_id: message.message_id,
        kind,
    })
}
