use thiserror::Error;

/// Error types for registration state machine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Invalid transition from {status}/{state} on {event}")]
    InvalidTransition {
        status: String,
        state: String,
        event: String,
    },

    #[error("Guard construction failed: {reason}")]
    GuardConstruction { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StateMachineError {
    pub fn invalid_transition(
        status: impl ToString,
        state: impl ToString,
        event: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            status: status.to_string(),
            state: state.to_string(),
            event: event.into(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
