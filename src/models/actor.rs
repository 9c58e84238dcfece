use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state_machine::{ConversationState, VerificationStatus};

/// A chat-platform identity taking part as applicant or reviewer.
///
/// The record is the single source of truth for what the actor is asked next;
/// routers and handlers hold no conversation context of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    /// Stable numeric handle assigned by the transport
    pub handle: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub government_id: Option<String>,
    /// ISO country code from the configured allow-list
    pub location_country: Option<String>,
    pub verification_status: VerificationStatus,
    pub conversation_state: ConversationState,
    pub verification_strategy: Option<String>,
    /// Opaque queue reference of the relayed identity document
    pub identity_doc_ref: Option<String>,
    pub is_reviewer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Actor {
    /// A fresh applicant at the start of registration
    pub fn new_applicant(handle: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            handle,
            first_name: None,
            last_name: None,
            phone_number: None,
            government_id: None,
            location_country: None,
            verification_status: VerificationStatus::Pending,
            conversation_state: ConversationState::AwaitingFirstName,
            verification_strategy: None,
            identity_doc_ref: None,
            is_reviewer: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_reviewer(handle: i64) -> Self {
        Self {
            is_reviewer: true,
            conversation_state: ConversationState::None,
            ..Self::new_applicant(handle)
        }
    }

    /// Blank every collected profile attribute
    pub fn clear_profile(&mut self) {
        self.first_name = None;
        self.last_name = None;
        self.phone_number = None;
        self.government_id = None;
        self.location_country = None;
        self.verification_strategy = None;
        self.identity_doc_ref = None;
    }

    pub fn has_complete_profile(&self) -> bool {
        self.first_name.is_some()
            && self.last_name.is_some()
            && self.phone_number.is_some()
            && self.government_id.is_some()
            && self.location_country.is_some()
            && self.verification_strategy.is_some()
            && self.identity_doc_ref.is_some()
    }

    pub fn has_blank_profile(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.government_id.is_none()
            && self.location_country.is_none()
            && self.verification_strategy.is_none()
            && self.identity_doc_ref.is_none()
    }

    /// "First Last" with whatever parts are known
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applicant_starts_registration() {
        let actor = Actor::new_applicant(42);
        assert_eq!(actor.handle, 42);
        assert_eq!(actor.verification_status, VerificationStatus::Pending);
        assert_eq!(
            actor.conversation_state,
            ConversationState::AwaitingFirstName
        );
        assert!(actor.has_blank_profile());
        assert!(!actor.is_reviewer);
    }

    #[test]
    fn test_clear_profile_keeps_identity() {
        let mut actor = Actor::new_applicant(7);
        actor.first_name = Some("John".into());
        actor.phone_number = Some("+15551234567".into());
        actor.identity_doc_ref = Some("99".into());
        let id = actor.id;

        actor.clear_profile();

        assert!(actor.has_blank_profile());
        assert_eq!(actor.id, id);
        assert_eq!(actor.handle, 7);
    }

    #[test]
    fn test_display_name_skips_missing_parts() {
        let mut actor = Actor::new_applicant(1);
        assert_eq!(actor.display_name(), "");
        actor.first_name = Some("Ada".into());
        assert_eq!(actor.display_name(), "Ada");
        actor.last_name = Some("Lovelace".into());
        assert_eq!(actor.display_name(), "Ada Lovelace");
    }
}
