use serde::{Deserialize, Serialize};

/// Events that can move an actor through registration and review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RegistrationEvent {
    /// Registration (re)started from the first field
    Started,
    /// A profile field passed validation at the current step
    FieldAccepted,
    /// The identity artifact was relayed, carrying the queue's storage reference
    DocumentSubmitted(String),
    /// The actor accepted the terms
    PolicyAccepted,
    /// The actor declined the terms
    PolicyDeclined,
    /// A reviewer approved the submitted identity
    ReviewApproved,
    /// A reviewer rejected the submitted identity
    ReviewRejected,
}

impl RegistrationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::FieldAccepted => "field_accepted",
            Self::DocumentSubmitted(_) => "document_submitted",
            Self::PolicyAccepted => "policy_accepted",
            Self::PolicyDeclined => "policy_declined",
            Self::ReviewApproved => "review_approved",
            Self::ReviewRejected => "review_rejected",
        }
    }

    /// Events that wipe the collected profile
    pub fn clears_profile(&self) -> bool {
        matches!(self, Self::Started | Self::PolicyDeclined | Self::ReviewRejected)
    }
}
