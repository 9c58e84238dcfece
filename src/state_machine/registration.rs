//! # Registration State Machine
//!
//! Drives an [`Actor`] through the registration workflow:
//!
//! ```text
//! awaiting_first_name → awaiting_last_name → awaiting_phone → awaiting_gov_id
//!   → awaiting_location → awaiting_identity_document → awaiting_policy_approval → none
//! ```
//!
//! Two tables make up the machine:
//!
//! - [`RegistrationStateMachine::evaluate`]: (state × input shape) → accepted field or
//!   [`Rejection`]. Pure; never touches the actor.
//! - [`determine_target`]: (status × state × event) → next (status, state). Every pair not
//!   listed is an [`StateMachineError::InvalidTransition`].
//!
//! Applying a transition only mutates the in-memory record. Callers persist it and on
//! persistence failure drop the mutated copy, so the stored state is unchanged and the
//! step can be retried.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::RegistrationEvent;
use super::guards::{InputKind, NameField, Rejection, RegistrationGuards};
use super::states::{ConversationState, VerificationStatus};
use crate::models::{Actor, MessageContent, PhotoAttachment, SharedContact};

/// A free-form message viewed by its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationInput<'a> {
    Text(&'a str),
    Contact(&'a SharedContact),
    Photo(&'a PhotoAttachment),
}

impl<'a> RegistrationInput<'a> {
    /// Photo wins over contact, contact over text
    pub fn from_content(content: &'a MessageContent) -> Self {
        if let Some(photo) = &content.photo {
            Self::Photo(photo)
        } else if let Some(contact) = &content.contact {
            Self::Contact(contact)
        } else {
            Self::Text(content.text.as_deref().unwrap_or_default())
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Text(_) => InputKind::Text,
            Self::Contact(_) => InputKind::Contact,
            Self::Photo(_) => InputKind::Photo,
        }
    }
}

/// A validated answer to the current step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedInput {
    FirstName(String),
    LastName(String),
    PhoneNumber(String),
    GovernmentId(String),
    Location {
        country_code: String,
        strategy: String,
    },
    /// Needs relaying before the actor can advance
    IdentityDocument(PhotoAttachment),
}

/// Outcome of applying an event to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from_status: VerificationStatus,
    pub from_state: ConversationState,
    pub to_status: VerificationStatus,
    pub to_state: ConversationState,
}

/// Look up the next (status, state) for an event
pub fn determine_target(
    status: VerificationStatus,
    state: ConversationState,
    event: &RegistrationEvent,
) -> StateMachineResult<(VerificationStatus, ConversationState)> {
    use ConversationState as S;
    use RegistrationEvent as E;
    use VerificationStatus as V;

    let target = match (status, state, event) {
        // (Re)start from the first field
        (V::Pending | V::Rejected, _, E::Started) => (V::Pending, S::AwaitingFirstName),

        // Field steps, in order
        (V::Pending, s, E::FieldAccepted) if s.collects_field() => (V::Pending, s.next()),
        // A rejected actor re-registering answers the first field without /start
        (V::Rejected, S::AwaitingFirstName, E::FieldAccepted) => {
            (V::Pending, S::AwaitingLastName)
        }

        (V::Pending, S::AwaitingIdentityDocument, E::DocumentSubmitted(_)) => {
            (V::Pending, S::AwaitingPolicyApproval)
        }

        // Policy decision
        (V::Pending, S::AwaitingPolicyApproval, E::PolicyAccepted) => (V::Pending, S::None),
        (V::Pending, S::AwaitingPolicyApproval, E::PolicyDeclined) => {
            (V::Pending, S::AwaitingFirstName)
        }

        // Reviewer decision, only out of pending
        (V::Pending, _, E::ReviewApproved) => (V::Approved, S::None),
        (V::Pending, _, E::ReviewRejected) => (V::Rejected, S::AwaitingFirstName),

        (status, state, event) => {
            return Err(StateMachineError::invalid_transition(
                status,
                state,
                event.event_type(),
            ))
        }
    };

    Ok(target)
}

/// Registration workflow over an actor record
#[derive(Debug, Clone)]
pub struct RegistrationStateMachine {
    guards: RegistrationGuards,
}

impl RegistrationStateMachine {
    pub fn new(guards: RegistrationGuards) -> Self {
        Self { guards }
    }

    pub fn guards(&self) -> &RegistrationGuards {
        &self.guards
    }

    /// Validate an input against the actor's current step
    pub fn evaluate(
        &self,
        state: ConversationState,
        input: RegistrationInput<'_>,
        sender_handle: i64,
    ) -> Result<AcceptedInput, Rejection> {
        use ConversationState as S;
        use RegistrationInput as I;

        match (state, input) {
            (S::AwaitingFirstName, I::Text(text)) => self
                .guards
                .check_name(NameField::First, text)
                .map(AcceptedInput::FirstName),
            (S::AwaitingLastName, I::Text(text)) => self
                .guards
                .check_name(NameField::Last, text)
                .map(AcceptedInput::LastName),
            (S::AwaitingPhone, I::Contact(contact)) => self
                .guards
                .check_phone(contact, sender_handle)
                .map(AcceptedInput::PhoneNumber),
            (S::AwaitingGovId, I::Text(text)) => self
                .guards
                .check_government_id(text)
                .map(AcceptedInput::GovernmentId),
            (S::AwaitingLocation, I::Text(text)) => {
                self.guards
                    .resolve_country(text)
                    .map(|(country_code, strategy)| AcceptedInput::Location {
                        country_code,
                        strategy,
                    })
            }
            (S::AwaitingIdentityDocument, I::Photo(photo)) => {
                Ok(AcceptedInput::IdentityDocument(photo.clone()))
            }
            (S::AwaitingPolicyApproval, _) => Err(Rejection::AwaitingPolicyDecision),
            (S::None, _) => Err(Rejection::NotRegistering),
            (state, input) => Err(Rejection::UnexpectedInput {
                state,
                expected: expected_input(state).unwrap_or(InputKind::Text),
                received: input.kind(),
            }),
        }
    }

    /// Store an accepted field and advance one step.
    ///
    /// Identity documents are not applied here: they advance through
    /// [`RegistrationEvent::DocumentSubmitted`] once the queue returns a reference.
    pub fn accept_field(
        &self,
        actor: &mut Actor,
        accepted: AcceptedInput,
    ) -> StateMachineResult<Transition> {
        let mut candidate = actor.clone();
        match accepted {
            AcceptedInput::FirstName(name) => candidate.first_name = Some(name),
            AcceptedInput::LastName(name) => candidate.last_name = Some(name),
            AcceptedInput::PhoneNumber(phone) => candidate.phone_number = Some(phone),
            AcceptedInput::GovernmentId(id) => candidate.government_id = Some(id),
            AcceptedInput::Location {
                country_code,
                strategy,
            } => {
                candidate.location_country = Some(country_code);
                candidate.verification_strategy = Some(strategy);
            }
            AcceptedInput::IdentityDocument(_) => {
                return Err(StateMachineError::Internal(
                    "identity documents advance via DocumentSubmitted".to_string(),
                ))
            }
        }

        let transition = Self::apply(&mut candidate, &RegistrationEvent::FieldAccepted)?;
        *actor = candidate;
        Ok(transition)
    }

    /// Apply an event to the actor record in place.
    ///
    /// Leaves the actor untouched when the transition is invalid.
    pub fn apply(actor: &mut Actor, event: &RegistrationEvent) -> StateMachineResult<Transition> {
        let from_status = actor.verification_status;
        let from_state = actor.conversation_state;
        let (to_status, to_state) = determine_target(from_status, from_state, event)?;

        if event.clears_profile() {
            actor.clear_profile();
        }
        if let RegistrationEvent::DocumentSubmitted(storage_ref) = event {
            actor.identity_doc_ref = Some(storage_ref.clone());
        }

        actor.verification_status = to_status;
        actor.conversation_state = to_state;
        actor.touch();

        Ok(Transition {
            from_status,
            from_state,
            to_status,
            to_state,
        })
    }
}

/// The message shape a state waits for; `None` when it waits for a button or nothing
pub fn expected_input(state: ConversationState) -> Option<InputKind> {
    match state {
        ConversationState::AwaitingFirstName
        | ConversationState::AwaitingLastName
        | ConversationState::AwaitingGovId
        | ConversationState::AwaitingLocation => Some(InputKind::Text),
        ConversationState::AwaitingPhone => Some(InputKind::Contact),
        ConversationState::AwaitingIdentityDocument => Some(InputKind::Photo),
        ConversationState::AwaitingPolicyApproval | ConversationState::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountryStrategy;
    use std::collections::BTreeMap;

    fn machine() -> RegistrationStateMachine {
        let mut countries = BTreeMap::new();
        countries.insert(
            "DE".to_string(),
            CountryStrategy {
                title: "Germany".to_string(),
                strategy: "sepa".to_string(),
            },
        );
        RegistrationStateMachine::new(RegistrationGuards::new(countries).unwrap())
    }

    fn text(content: &str) -> MessageContent {
        MessageContent {
            text: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_name_advances() {
        let machine = machine();
        let mut actor = Actor::new_applicant(1);
        let content = text("John");

        let accepted = machine
            .evaluate(
                actor.conversation_state,
                RegistrationInput::from_content(&content),
                1,
            )
            .unwrap();
        let transition = machine.accept_field(&mut actor, accepted).unwrap();

        assert_eq!(transition.to_state, ConversationState::AwaitingLastName);
        assert_eq!(actor.first_name.as_deref(), Some("John"));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let machine = machine();
        let content = MessageContent {
            contact: Some(SharedContact {
                phone_number: "+491701234567".to_string(),
                owner_handle: Some(1),
            }),
            ..Default::default()
        };

        let rejection = machine
            .evaluate(
                ConversationState::AwaitingFirstName,
                RegistrationInput::from_content(&content),
                1,
            )
            .unwrap_err();

        assert_eq!(
            rejection,
            Rejection::UnexpectedInput {
                state: ConversationState::AwaitingFirstName,
                expected: InputKind::Text,
                received: InputKind::Contact,
            }
        );
    }

    #[test]
    fn test_policy_step_ignores_text() {
        let machine = machine();
        let content = text("yes");
        assert_eq!(
            machine.evaluate(
                ConversationState::AwaitingPolicyApproval,
                RegistrationInput::from_content(&content),
                1
            ),
            Err(Rejection::AwaitingPolicyDecision)
        );
    }

    #[test]
    fn test_document_submission_stores_reference() {
        let mut actor = Actor::new_applicant(1);
        actor.conversation_state = ConversationState::AwaitingIdentityDocument;

        let transition = RegistrationStateMachine::apply(
            &mut actor,
            &RegistrationEvent::DocumentSubmitted("1234".to_string()),
        )
        .unwrap();

        assert_eq!(
            transition.to_state,
            ConversationState::AwaitingPolicyApproval
        );
        assert_eq!(actor.identity_doc_ref.as_deref(), Some("1234"));
    }

    #[test]
    fn test_decline_restarts_with_blank_profile() {
        let mut actor = Actor::new_applicant(1);
        actor.first_name = Some("John".to_string());
        actor.identity_doc_ref = Some("12".to_string());
        actor.conversation_state = ConversationState::AwaitingPolicyApproval;

        RegistrationStateMachine::apply(&mut actor, &RegistrationEvent::PolicyDeclined).unwrap();

        assert!(actor.has_blank_profile());
        assert_eq!(
            actor.conversation_state,
            ConversationState::AwaitingFirstName
        );
        assert_eq!(actor.verification_status, VerificationStatus::Pending);
    }

    #[test]
    fn test_review_only_out_of_pending() {
        let mut actor = Actor::new_applicant(1);
        actor.conversation_state = ConversationState::None;
        RegistrationStateMachine::apply(&mut actor, &RegistrationEvent::ReviewApproved).unwrap();
        assert_eq!(actor.verification_status, VerificationStatus::Approved);

        let before = actor.clone();
        let err = RegistrationStateMachine::apply(&mut actor, &RegistrationEvent::ReviewRejected)
            .unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
        assert_eq!(actor, before);
    }

    #[test]
    fn test_rejected_actor_reregisters_on_first_field() {
        let target = determine_target(
            VerificationStatus::Rejected,
            ConversationState::AwaitingFirstName,
            &RegistrationEvent::FieldAccepted,
        )
        .unwrap();
        assert_eq!(
            target,
            (VerificationStatus::Pending, ConversationState::AwaitingLastName)
        );
    }

    #[test]
    fn test_field_event_outside_field_step_is_invalid() {
        assert!(determine_target(
            VerificationStatus::Pending,
            ConversationState::AwaitingPolicyApproval,
            &RegistrationEvent::FieldAccepted,
        )
        .is_err());
        assert!(determine_target(
            VerificationStatus::Approved,
            ConversationState::None,
            &RegistrationEvent::PolicyAccepted,
        )
        .is_err());
    }
}
