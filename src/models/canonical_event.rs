//! Normalized inbound update shape shared by both actor pools.

use serde::{Deserialize, Serialize};

/// A contact card shared by the actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContact {
    pub phone_number: String,
    /// Transport handle of the person on the card, when the transport knows it
    pub owner_handle: Option<i64>,
}

/// An uploaded image, referenced by the transport's file handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub file_id: String,
    pub file_size: Option<i64>,
}

/// Free-form message body; at least one part is present
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    pub text: Option<String>,
    pub contact: Option<SharedContact>,
    pub photo: Option<PhotoAttachment>,
}

impl MessageContent {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.contact.is_none() && self.photo.is_none()
    }

    /// Short label used in logs
    pub fn describe(&self) -> &'static str {
        if self.photo.is_some() {
            "photo"
        } else if self.contact.is_some() {
            "contact"
        } else {
            "text"
        }
    }
}

/// What the actor did. Exactly one variant per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// `/name args`; name excludes the leading slash and any `@bot` suffix
    Command { name: String, arguments: String },
    /// Inline button press
    Callback { query_id: String, data: String },
    /// Plain text, contact share or photo upload
    Content(MessageContent),
}

/// Normalized envelope for one inbound transport update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Transport handle of the sender
    pub actor_handle: i64,
    /// Conversation the update arrived in
    pub chat_id: i64,
    /// Message the update refers to (the pressed keyboard's message for callbacks)
    pub message_id: i64,
    pub kind: EventKind,
}

impl CanonicalEvent {
    pub fn command(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Command { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Callback { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn callback_query_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Callback { query_id, .. } => Some(query_id),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&MessageContent> {
        match &self.kind {
            EventKind::Content(content) => Some(content),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EventKind::Command { .. } => "command",
            EventKind::Callback { .. } => "callback",
            EventKind::Content(_) => "content",
        }
    }
}
