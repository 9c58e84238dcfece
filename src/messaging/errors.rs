//! # Messaging Error Types
//!
//! Failures of the verification queue, kept as structured variants rather
//! than boxed errors so callers can tell transport trouble from bad captions.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("Queue publish failed: {queue_name}: {message}")]
    Publish { queue_name: String, message: String },

    #[error("Relay caption could not be parsed: {reason}")]
    CaptionParse { reason: String },

    #[error("Queue subscription failed: {queue_name}: {message}")]
    Subscribe { queue_name: String, message: String },

    #[error("Verification handler failed: {message}")]
    Handler { message: String },
}

impl QueueError {
    pub fn publish(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            queue_name: queue_name.into(),
            message: message.into(),
        }
    }

    pub fn caption_parse(reason: impl Into<String>) -> Self {
        Self::CaptionParse {
            reason: reason.into(),
        }
    }

    pub fn subscribe(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            queue_name: queue_name.into(),
            message: message.into(),
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Whether resubmitting the same artifact could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Publish { .. })
    }
}

impl From<TransportError> for QueueError {
    fn from(err: TransportError) -> Self {
        Self::publish("relay_channel", err.to_string())
    }
}

pub type QueueResult<T> = Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failures_are_retryable_publish_errors() {
        let err: QueueError = TransportError::api("sendPhoto", "chat not found").into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("chat not found"));
        assert!(!QueueError::caption_parse("missing line").is_retryable());
    }
}
