//! Registration message handler.
//!
//! Free-form content from an applicant is evaluated against their current
//! step. Rejections get a corrective prompt and change nothing; accepted
//! fields are persisted before the next prompt goes out. A failed write
//! leaves the stored record on the old step so the actor can simply resend.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::errors::HandlerResult;
use super::{prompts, reply_then_fail};
use crate::database::ActorRepository;
use crate::messaging::{build_relay_caption, VerificationQueue};
use crate::models::{
    Actor, CanonicalEvent, MessageBuilder, PhotoAttachment, SendMessageParams, VerificationEvent,
};
use crate::registry::MessageHandler;
use crate::state_machine::{
    AcceptedInput, ConversationState, NameField, RegistrationEvent, RegistrationInput,
    RegistrationStateMachine, Rejection,
};
use crate::transport::ChatTransport;

pub struct RegistrationHandler {
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
    queue: Arc<dyn VerificationQueue>,
    machine: Arc<RegistrationStateMachine>,
    country_titles: Vec<String>,
    policy_url: String,
}

impl RegistrationHandler {
    pub fn new(
        repository: Arc<dyn ActorRepository>,
        transport: Arc<dyn ChatTransport>,
        queue: Arc<dyn VerificationQueue>,
        machine: Arc<RegistrationStateMachine>,
        policy_url: impl Into<String>,
    ) -> Self {
        let country_titles = machine.guards().country_titles();
        Self {
            repository,
            transport,
            queue,
            machine,
            country_titles,
            policy_url: policy_url.into(),
        }
    }

    async fn accept(
        &self,
        event: &CanonicalEvent,
        actor: Actor,
        accepted: AcceptedInput,
    ) -> HandlerResult {
        let mut updated = actor;
        let transition = self.machine.accept_field(&mut updated, accepted)?;
        if let Err(err) = self.repository.update(&updated).await {
            return reply_then_fail(
                self.transport.as_ref(),
                event.chat_id,
                prompts::INTERNAL_ERROR,
                err,
            )
            .await;
        }
        debug!(
            actor_id = %updated.id,
            from = %transition.from_state,
            to = %transition.to_state,
            "💾 Registration step persisted"
        );

        if let Some(prompt) = self.next_prompt(event.chat_id, &updated) {
            self.transport.send_message(prompt).await?;
        }
        Ok(())
    }

    fn next_prompt(&self, chat_id: i64, actor: &Actor) -> Option<SendMessageParams> {
        let builder = MessageBuilder::new(chat_id);
        let params = match actor.conversation_state {
            ConversationState::AwaitingLastName => builder.text(prompts::AFTER_FIRST_NAME).build(),
            ConversationState::AwaitingPhone => {
                prompts::contact_request(chat_id, prompts::AFTER_LAST_NAME)
            }
            ConversationState::AwaitingGovId => builder
                .text(prompts::AFTER_PHONE)
                .remove_keyboard()
                .build(),
            ConversationState::AwaitingLocation => prompts::after_gov_id(
                chat_id,
                actor.first_name.as_deref().unwrap_or_default(),
                &self.country_titles,
            ),
            ConversationState::AwaitingIdentityDocument => builder
                .text(prompts::AFTER_LOCATION)
                .remove_keyboard()
                .build(),
            ConversationState::AwaitingFirstName
            | ConversationState::AwaitingPolicyApproval
            | ConversationState::None => return None,
        };
        Some(params)
    }

    /// Relay the document, then store the queue reference and move to the policy step
    async fn submit_document(
        &self,
        event: &CanonicalEvent,
        actor: Actor,
        photo: PhotoAttachment,
    ) -> HandlerResult {
        info!(actor_id = %actor.id, file_id = %photo.file_id, "📦 Publishing identity document for review");
        let verification =
            VerificationEvent::new(actor.id, photo.file_id, build_relay_caption(&actor));

        let storage_ref = match self.queue.publish(&verification).await {
            Ok(storage_ref) => storage_ref,
            Err(err) => {
                return reply_then_fail(
                    self.transport.as_ref(),
                    event.chat_id,
                    prompts::SUBMISSION_FAILED,
                    err,
                )
                .await
            }
        };

        let mut updated = actor;
        RegistrationStateMachine::apply(
            &mut updated,
            &RegistrationEvent::DocumentSubmitted(storage_ref.clone()),
        )?;
        if let Err(err) = self.repository.update(&updated).await {
            return reply_then_fail(
                self.transport.as_ref(),
                event.chat_id,
                prompts::INTERNAL_ERROR,
                err,
            )
            .await;
        }
        info!(actor_id = %updated.id, storage_ref = %storage_ref, "✅ Document relayed; awaiting policy decision");

        self.transport
            .send_message(prompts::policy_prompt(event.chat_id, &self.policy_url))
            .await?;
        Ok(())
    }

    fn rejection_reply(&self, chat_id: i64, rejection: &Rejection) -> Option<SendMessageParams> {
        let params = match rejection {
            Rejection::UnexpectedInput { state, .. } => match state {
                ConversationState::AwaitingFirstName => {
                    prompts::wrong_name_input(chat_id, NameField::First)
                }
                ConversationState::AwaitingLastName => {
                    prompts::wrong_name_input(chat_id, NameField::Last)
                }
                ConversationState::AwaitingPhone => {
                    prompts::contact_request(chat_id, prompts::PRESS_PHONE_BUTTON)
                }
                ConversationState::AwaitingGovId => prompts::plain(chat_id, prompts::GOV_ID_AS_TEXT),
                ConversationState::AwaitingLocation => {
                    prompts::country_request(chat_id, prompts::ASK_LOCATION, &self.country_titles)
                }
                ConversationState::AwaitingIdentityDocument => {
                    prompts::markdown(chat_id, prompts::DOCUMENT_NOT_PHOTO)
                }
                other => prompts::state_prompt(chat_id, *other, &self.country_titles)?,
            },
            Rejection::NameLength { field, .. } => prompts::invalid_name(chat_id, *field),
            Rejection::ForeignContact { .. } => {
                prompts::contact_request(chat_id, prompts::FOREIGN_CONTACT)
            }
            Rejection::MalformedPhone { .. } => MessageBuilder::new(chat_id)
                .text(prompts::MALFORMED_PHONE)
                .plain()
                .remove_keyboard()
                .build(),
            Rejection::GovernmentIdLength { .. } => {
                prompts::markdown(chat_id, prompts::INVALID_GOV_ID)
            }
            Rejection::UnsupportedCountry { choice } => {
                prompts::unsupported_country(chat_id, choice, &self.country_titles)
            }
            Rejection::AwaitingPolicyDecision => {
                prompts::policy_reminder(chat_id, &self.policy_url)
            }
            Rejection::NotRegistering => return None,
        };
        Some(params)
    }
}

#[async_trait]
impl MessageHandler for RegistrationHandler {
    fn name(&self) -> &str {
        "registration"
    }

    #[instrument(skip(self, event, actor), fields(actor_id = %actor.id, state = %actor.conversation_state))]
    async fn handle(&self, event: &CanonicalEvent, actor: Actor) -> HandlerResult {
        let Some(content) = event.content() else {
            // An unrecognised command: repeat the current step
            if let Some(prompt) =
                prompts::state_prompt(event.chat_id, actor.conversation_state, &self.country_titles)
            {
                self.transport.send_message(prompt).await?;
            }
            return Ok(());
        };

        let input = RegistrationInput::from_content(content);
        match self
            .machine
            .evaluate(actor.conversation_state, input, event.actor_handle)
        {
            Ok(AcceptedInput::IdentityDocument(photo)) => {
                self.submit_document(event, actor, photo).await
            }
            Ok(accepted) => self.accept(event, actor, accepted).await,
            Err(Rejection::NotRegistering) => {
                warn!(
                    status = %actor.verification_status,
                    input = content.describe(),
                    "Received content outside registration; ignoring"
                );
                Ok(())
            }
            Err(rejection) => {
                debug!(?rejection, "Input rejected; re-prompting");
                if let Some(reply) = self.rejection_reply(event.chat_id, &rejection) {
                    self.transport.send_message(reply).await?;
                }
                Ok(())
            }
        }
    }
}
