mod common;

use common::strategies::*;
use proptest::prelude::*;

use relay_core::messaging::{build_relay_caption, parse_actor_id};
use relay_core::models::{Actor, SharedContact};
use relay_core::state_machine::{
    AcceptedInput, ConversationState, RegistrationGuards, RegistrationInput,
    RegistrationStateMachine, Rejection,
};

fn machine() -> RegistrationStateMachine {
    RegistrationStateMachine::new(
        RegistrationGuards::new(common::countries()).expect("guards should build"),
    )
}

proptest! {
    /// Property: any name of 2 to 50 characters advances the first-name step
    #[test]
    fn valid_first_names_advance_and_persist(name in valid_name_strategy()) {
        let machine = machine();
        let mut actor = Actor::new_applicant(7);

        let accepted = machine
            .evaluate(ConversationState::AwaitingFirstName, RegistrationInput::Text(&name), 7)
            .expect("name should be accepted");
        machine.accept_field(&mut actor, accepted).expect("transition should apply");

        prop_assert_eq!(actor.conversation_state, ConversationState::AwaitingLastName);
        prop_assert_eq!(actor.first_name.as_deref(), Some(name.trim()));
    }

    /// Property: out-of-range names are rejected and leave the record alone
    #[test]
    fn invalid_names_never_advance(name in invalid_name_strategy()) {
        let machine = machine();
        let actor = Actor::new_applicant(7);

        let outcome =
            machine.evaluate(ConversationState::AwaitingFirstName, RegistrationInput::Text(&name), 7);
        let is_length_rejection = matches!(outcome, Err(Rejection::NameLength { .. }));
        prop_assert!(is_length_rejection, "unexpected outcome {:?}", outcome);
        prop_assert_eq!(actor.conversation_state, ConversationState::AwaitingFirstName);
        prop_assert_eq!(actor.first_name, None);
    }

    /// Property: a contact card belonging to someone else is never accepted,
    /// however many times it is sent
    #[test]
    fn foreign_contacts_are_always_rejected(
        (sender, owner) in handle_pair_strategy(),
        phone in valid_phone_strategy(),
        repeats in 1usize..5,
    ) {
        let machine = machine();
        let contact = SharedContact { phone_number: phone, owner_handle: Some(owner) };

        for _ in 0..repeats {
            let outcome = machine.evaluate(
                ConversationState::AwaitingPhone,
                RegistrationInput::Contact(&contact),
                sender,
            );
            let is_foreign = matches!(outcome, Err(Rejection::ForeignContact { .. }));
            prop_assert!(is_foreign);
        }
    }

    /// Property: the actor's own well-formed number is accepted verbatim
    #[test]
    fn own_contact_with_valid_phone_is_accepted(handle in 1i64..1_000_000_000, phone in valid_phone_strategy()) {
        let contact = SharedContact { phone_number: phone.clone(), owner_handle: Some(handle) };
        let outcome = machine().evaluate(
            ConversationState::AwaitingPhone,
            RegistrationInput::Contact(&contact),
            handle,
        );
        prop_assert_eq!(outcome, Ok(AcceptedInput::PhoneNumber(phone)));
    }

    #[test]
    fn malformed_phones_are_rejected(handle in 1i64..1_000_000_000, phone in malformed_phone_strategy()) {
        let contact = SharedContact { phone_number: phone, owner_handle: Some(handle) };
        let outcome = machine().evaluate(
            ConversationState::AwaitingPhone,
            RegistrationInput::Contact(&contact),
            handle,
        );
        let is_malformed = matches!(outcome, Err(Rejection::MalformedPhone { .. }));
        prop_assert!(is_malformed);
    }

    #[test]
    fn government_ids_within_bounds_are_accepted(id in government_id_strategy()) {
        let outcome = machine().evaluate(
            ConversationState::AwaitingGovId,
            RegistrationInput::Text(&id),
            1,
        );
        prop_assert_eq!(outcome, Ok(AcceptedInput::GovernmentId(id)));
    }

    /// Property: free text never answers the policy step
    #[test]
    fn text_never_answers_the_policy_step(text in ".{0,80}") {
        let outcome = machine().evaluate(
            ConversationState::AwaitingPolicyApproval,
            RegistrationInput::Text(&text),
            1,
        );
        prop_assert_eq!(outcome, Err(Rejection::AwaitingPolicyDecision));
    }

    /// Property: profile text can never hide or forge the actor id line
    #[test]
    fn relay_caption_always_yields_the_actor_id(
        first in "[^\n]{0,40}",
        gov_id in "[^\n]{0,40}",
    ) {
        let mut actor = Actor::new_applicant(3);
        actor.first_name = Some(first);
        actor.government_id = Some(gov_id);

        let caption = build_relay_caption(&actor);
        prop_assert_eq!(parse_actor_id(&caption).ok(), Some(actor.id));
    }
}
