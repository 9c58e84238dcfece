//! End-to-end registration and review through both actor pools.

mod common;

use std::time::Duration;

use common::{RelayHarness, REVIEWER_HANDLE, REVIEW_CHANNEL};
use relay_core::database::ActorRepository;
use relay_core::constants::callbacks;
use relay_core::execution::BEGIN_REGISTRATION_PROMPT;
use relay_core::handlers::prompts;
use relay_core::test_helpers::fixtures;
use relay_core::{ConversationState, VerificationStatus};

#[tokio::test]
async fn test_registration_round_trip_ends_pending_with_full_profile() {
    let harness = RelayHarness::start().await;

    let actor = harness.register(11, "John").await;

    assert_eq!(actor.conversation_state, ConversationState::None);
    assert_eq!(actor.verification_status, VerificationStatus::Pending);
    assert!(actor.has_complete_profile());
    assert_eq!(actor.first_name.as_deref(), Some("John"));
    assert_eq!(actor.last_name.as_deref(), Some("Doe"));
    assert_eq!(actor.phone_number.as_deref(), Some("+4915112345678"));
    assert_eq!(actor.government_id.as_deref(), Some("AB123456"));
    assert_eq!(actor.location_country.as_deref(), Some("DE"));
    assert_eq!(actor.verification_strategy.as_deref(), Some("sepa"));
    assert!(actor.identity_doc_ref.is_some());

    let relayed = harness.applicant.sent_photos();
    assert_eq!(relayed.len(), 1);
    assert!(relayed[0]
        .caption
        .contains(&format!("UserID: {}", actor.id)));
    assert!(harness
        .applicant
        .last_message_text()
        .unwrap()
        .contains("Registration Complete"));

    harness.stop().await;
}

#[tokio::test]
async fn test_reviewer_approval_reaches_the_applicant() {
    let harness = RelayHarness::start().await;
    let actor = harness.register(12, "Ada").await;

    let review = harness.relay_to_review(&actor, 1).await;
    assert!(review.caption.contains(&actor.id.to_string()));
    assert_eq!(
        review.approve,
        callbacks::approval_payload(callbacks::APPROVAL_ACCEPT, &actor.id)
    );

    harness.reviewer_feed.push(vec![fixtures::callback_on_message(
        2,
        REVIEWER_HANDLE,
        REVIEW_CHANNEL,
        1000,
        &review.approve,
    )]);

    let approved = harness
        .wait_for_actor(12, "approval", |a| {
            a.verification_status == VerificationStatus::Approved
        })
        .await;
    assert_eq!(approved.first_name.as_deref(), Some("Ada"));
    assert!(approved.has_complete_profile());

    let applicant = harness.applicant.clone();
    common::wait_for("approval notice", || {
        applicant.last_message_text().as_deref() == Some(prompts::APPROVED_NOTICE)
    })
    .await;

    let summary = harness.stop().await;
    assert!(summary.bus_drained);
    assert_eq!(summary.applicant.processor_panics, 0);
    assert_eq!(summary.reviewer.processor_panics, 0);
}

#[tokio::test]
async fn test_cancel_during_approval_still_notifies_the_applicant() {
    let harness = RelayHarness::start().await;
    let actor = harness.register(14, "Linus").await;
    let review = harness.relay_to_review(&actor, 1).await;

    // Keep the approval handler inside its reviewer-side calls while we cancel
    harness.reviewer.set_latency(Duration::from_millis(150));
    let published_before = harness.system.bus().get_statistics().events_published;
    harness.reviewer_feed.push(vec![fixtures::callback_on_message(
        2,
        REVIEWER_HANDLE,
        REVIEW_CHANNEL,
        1000,
        &review.approve,
    )]);
    let bus = harness.system.bus().clone();
    common::wait_for("approval callback on the bus", || {
        bus.get_statistics().events_published > published_before && bus.in_flight() > 0
    })
    .await;
    assert!(harness
        .applicant
        .sent_messages()
        .iter()
        .all(|m| m.text != prompts::APPROVED_NOTICE));

    let applicant = harness.applicant.clone();
    let repository = harness.repository.clone();
    let summary = harness.stop().await;

    assert!(summary.bus_drained);
    assert_eq!(bus.get_statistics().dropped_after_shutdown, 0);
    assert_eq!(
        applicant.last_message_text().as_deref(),
        Some(prompts::APPROVED_NOTICE)
    );
    let approved = repository.get_by_handle(14).await.unwrap().unwrap();
    assert_eq!(approved.verification_status, VerificationStatus::Approved);
}

#[tokio::test]
async fn test_reviewer_rejection_allows_reregistration() {
    let harness = RelayHarness::start().await;
    let actor = harness.register(13, "Grace").await;
    let review = harness.relay_to_review(&actor, 1).await;

    harness.reviewer_feed.push(vec![fixtures::callback_on_message(
        2,
        REVIEWER_HANDLE,
        REVIEW_CHANNEL,
        1000,
        &review.reject,
    )]);

    let rejected = harness
        .wait_for_actor(13, "rejection", |a| {
            a.verification_status == VerificationStatus::Rejected
        })
        .await;
    assert_eq!(rejected.id, actor.id);
    assert!(rejected.has_blank_profile());
    assert_eq!(
        rejected.conversation_state,
        ConversationState::AwaitingFirstName
    );

    let reviewer = harness.reviewer.clone();
    common::wait_for("rejected caption", || {
        reviewer
            .edited_captions()
            .iter()
            .any(|c| c.caption == prompts::CAPTION_REJECTED)
    })
    .await;

    harness
        .applicant_feed
        .push(vec![fixtures::text_update(1400, 13, "/start")]);
    let restarted = harness
        .wait_for_actor(13, "restart", |a| {
            a.verification_status == VerificationStatus::Pending
        })
        .await;
    assert_eq!(restarted.id, actor.id);
    assert_eq!(
        restarted.conversation_state,
        ConversationState::AwaitingFirstName
    );

    harness.stop().await;
}

#[tokio::test]
async fn test_short_name_is_rejected_then_valid_name_advances() {
    let harness = RelayHarness::start().await;

    harness
        .applicant_feed
        .push(vec![fixtures::text_update(1, 21, "/start")]);
    let created = harness
        .wait_for_actor(21, "actor creation", |_| true)
        .await;
    assert_eq!(created.conversation_state, ConversationState::AwaitingFirstName);
    assert_eq!(created.verification_status, VerificationStatus::Pending);

    harness
        .applicant_feed
        .push(vec![fixtures::text_update(2, 21, "J")]);
    let applicant = harness.applicant.clone();
    common::wait_for("name rejection", || applicant.sent_messages().len() >= 2).await;
    let unchanged = harness.actor(21).await.unwrap();
    assert_eq!(unchanged.conversation_state, ConversationState::AwaitingFirstName);
    assert_eq!(unchanged.first_name, None);
    assert!(harness
        .applicant
        .last_message_text()
        .unwrap()
        .starts_with("Invalid first name"));

    harness
        .applicant_feed
        .push(vec![fixtures::text_update(3, 21, "John")]);
    let advanced = harness
        .wait_for_actor(21, "last name step", |a| {
            a.conversation_state == ConversationState::AwaitingLastName
        })
        .await;
    assert_eq!(advanced.first_name.as_deref(), Some("John"));
    harness
        .wait_for_reply_to(21, "last name prompt", |text| text == prompts::AFTER_FIRST_NAME)
        .await;

    harness.stop().await;
}

#[tokio::test]
async fn test_two_character_name_is_within_bounds() {
    let harness = RelayHarness::start().await;

    harness.applicant_feed.push(vec![
        fixtures::text_update(1, 22, "/start"),
        fixtures::text_update(2, 22, "Jo"),
    ]);
    let advanced = harness
        .wait_for_actor(22, "last name step", |a| {
            a.conversation_state == ConversationState::AwaitingLastName
        })
        .await;
    assert_eq!(advanced.first_name.as_deref(), Some("Jo"));

    harness.stop().await;
}

#[tokio::test]
async fn test_unregistered_actor_is_asked_to_begin() {
    let harness = RelayHarness::start().await;

    harness
        .applicant_feed
        .push(vec![fixtures::text_update(1, 31, "hello there")]);
    let applicant = harness.applicant.clone();
    common::wait_for("begin prompt", || !applicant.sent_messages().is_empty()).await;

    assert_eq!(
        harness.applicant.last_message_text().as_deref(),
        Some(BEGIN_REGISTRATION_PROMPT)
    );
    assert!(harness.actor(31).await.is_none());

    harness.stop().await;
}

#[tokio::test]
async fn test_foreign_contact_never_advances() {
    let harness = RelayHarness::start().await;

    harness.applicant_feed.push(vec![
        fixtures::text_update(1, 41, "/start"),
        fixtures::text_update(2, 41, "John"),
        fixtures::text_update(3, 41, "Doe"),
    ]);
    harness
        .wait_for_reply_to(41, "phone prompt", |text| text == prompts::AFTER_LAST_NAME)
        .await;

    let before = harness.applicant.sent_messages().len();
    harness.applicant_feed.push(
        (0..3)
            .map(|i| fixtures::contact_update(10 + i, 41, "+4915112345678", Some(999)))
            .collect(),
    );
    let applicant = harness.applicant.clone();
    common::wait_for("three contact rejections", || {
        applicant.sent_messages().len() >= before + 3
    })
    .await;

    let actor = harness.actor(41).await.unwrap();
    assert_eq!(actor.conversation_state, ConversationState::AwaitingPhone);
    assert_eq!(actor.phone_number, None);
    assert!(harness
        .applicant
        .sent_messages()
        .iter()
        .skip(before)
        .all(|m| m.text == prompts::FOREIGN_CONTACT));

    harness.stop().await;
}

#[tokio::test]
async fn test_policy_decline_restarts_the_flow() {
    let harness = RelayHarness::start().await;
    let handle = 51;

    harness.applicant_feed.push(vec![
        fixtures::text_update(1, handle, "/start"),
        fixtures::text_update(2, handle, "John"),
        fixtures::text_update(3, handle, "Doe"),
        fixtures::contact_update(4, handle, "+4915112345678", Some(handle)),
        fixtures::text_update(5, handle, "AB123456"),
        fixtures::text_update(6, handle, "United States"),
        fixtures::photo_update(7, handle, "doc-51"),
    ]);
    harness
        .wait_for_actor(handle, "policy step", |a| {
            a.conversation_state == ConversationState::AwaitingPolicyApproval
        })
        .await;

    harness
        .applicant_feed
        .push(vec![fixtures::callback_update(8, handle, callbacks::POLICY_DECLINE)]);
    let declined = harness
        .wait_for_actor(handle, "restart", |a| {
            a.conversation_state == ConversationState::AwaitingFirstName
        })
        .await;
    assert!(declined.has_blank_profile());
    assert_eq!(declined.verification_status, VerificationStatus::Pending);

    harness.stop().await;
}
