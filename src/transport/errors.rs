use thiserror::Error;

/// Failures talking to the chat platform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("HTTP request failed: {method}: {message}")]
    Http { method: String, message: String },

    #[error("API rejected {method}: {description}")]
    Api { method: String, description: String },

    #[error("Unexpected response for {method}: {message}")]
    Decode { method: String, message: String },

    #[error("Transport closed: {message}")]
    Closed { message: String },
}

impl TransportError {
    pub fn http(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn api(method: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            description: description.into(),
        }
    }

    pub fn decode(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::Closed {
            message: message.into(),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
