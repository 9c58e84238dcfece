use thiserror::Error;

use crate::database::RepositoryError;
use crate::messaging::QueueError;
use crate::state_machine::StateMachineError;
use crate::transport::TransportError;

/// Failures a handler reports back to its router.
///
/// Validation problems are not errors: handlers answer them with a corrective
/// prompt and return `Ok(())`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Repository failure: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Queue failure: {0}")]
    Queue(#[from] QueueError),

    #[error("State machine failure: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Invalid callback payload '{data}': {reason}")]
    InvalidCallback { data: String, reason: String },

    #[error("Event is missing {what}")]
    MissingPayload { what: String },
}

impl HandlerError {
    pub fn invalid_callback(data: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCallback {
            data: data.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_payload(what: impl Into<String>) -> Self {
        Self::MissingPayload { what: what.into() }
    }
}

pub type HandlerResult<T = ()> = Result<T, HandlerError>;
