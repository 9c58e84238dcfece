//! Error types for the relay.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Messaging error: {0}")]
    MessagingError(String),
    #[error("Security error: {0}")]
    SecurityError(String),
    #[error("State machine error: {0}")]
    StateMachineError(String),
    #[error("Event error: {0}")]
    EventError(String),
    #[error("Router error: {0}")]
    RouterError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        RelayError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RelayError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RelayError::DatabaseError(format!("Migration failed: {err}"))
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::ConfigurationError(err.to_string())
    }
}

impl From<crate::database::RepositoryError> for RelayError {
    fn from(err: crate::database::RepositoryError) -> Self {
        RelayError::DatabaseError(err.to_string())
    }
}

impl From<crate::transport::TransportError> for RelayError {
    fn from(err: crate::transport::TransportError) -> Self {
        RelayError::TransportError(err.to_string())
    }
}

impl From<crate::messaging::QueueError> for RelayError {
    fn from(err: crate::messaging::QueueError) -> Self {
        RelayError::MessagingError(err.to_string())
    }
}

impl From<crate::security::SecurityError> for RelayError {
    fn from(err: crate::security::SecurityError) -> Self {
        RelayError::SecurityError(err.to_string())
    }
}

impl From<crate::state_machine::StateMachineError> for RelayError {
    fn from(err: crate::state_machine::StateMachineError) -> Self {
        RelayError::StateMachineError(err.to_string())
    }
}

impl From<crate::registry::RegistryError> for RelayError {
    fn from(err: crate::registry::RegistryError) -> Self {
        RelayError::ConfigurationError(err.to_string())
    }
}

impl From<crate::config::ConfigurationError> for RelayError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        RelayError::ConfigurationError(err.to_string())
    }
}

impl From<crate::events::EventBusError> for RelayError {
    fn from(err: crate::events::EventBusError) -> Self {
        RelayError::EventError(err.to_string())
    }
}

impl From<crate::execution::RouterError> for RelayError {
    fn from(err: crate::execution::RouterError) -> Self {
        RelayError::RouterError(err.to_string())
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
