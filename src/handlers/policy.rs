use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::errors::{HandlerError, HandlerResult};
use super::{prompts, reply_then_fail};
use crate::constants::callbacks;
use crate::database::ActorRepository;
use crate::models::{AnswerCallbackParams, Actor, CanonicalEvent, EditMessageTextParams};
use crate::registry::CallbackHandler;
use crate::state_machine::{ConversationState, RegistrationEvent, RegistrationStateMachine};
use crate::transport::ChatTransport;

/// Accept/decline buttons under the terms-of-service prompt
pub struct PolicyCallback {
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
}

impl PolicyCallback {
    pub fn new(repository: Arc<dyn ActorRepository>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            repository,
            transport,
        }
    }

    /// Replace the prompt text, which also drops its buttons
    async fn close_prompt(&self, event: &CanonicalEvent, text: &str) {
        let params = EditMessageTextParams {
            chat_id: event.chat_id,
            message_id: event.message_id,
            text: text.to_string(),
            parse_mode: None,
        };
        if let Err(err) = self.transport.edit_message_text(params).await {
            warn!(error = %err, "Failed to edit policy prompt");
        }
    }
}

#[async_trait]
impl CallbackHandler for PolicyCallback {
    fn prefix(&self) -> &str {
        callbacks::POLICY_PREFIX
    }

    fn name(&self) -> &str {
        "policy_callback"
    }

    #[instrument(skip(self, event, actor), fields(actor_id = %actor.id))]
    async fn handle(&self, event: &CanonicalEvent, actor: Actor) -> HandlerResult {
        let query_id = event
            .callback_query_id()
            .ok_or_else(|| HandlerError::missing_payload("callback query id"))?;
        let data = event.callback_data().unwrap_or_default();

        // Stop the client's spinner before anything else can fail
        if let Err(err) = self
            .transport
            .answer_callback_query(AnswerCallbackParams::acknowledge(query_id))
            .await
        {
            warn!(error = %err, "Failed to answer policy callback");
        }

        let registration_event = match data {
            callbacks::POLICY_ACCEPT => RegistrationEvent::PolicyAccepted,
            callbacks::POLICY_DECLINE => RegistrationEvent::PolicyDeclined,
            other => return Err(HandlerError::invalid_callback(other, "unknown policy action")),
        };

        if actor.conversation_state != ConversationState::AwaitingPolicyApproval {
            info!(
                state = %actor.conversation_state,
                "Policy decision outside the policy step; ignoring"
            );
            self.close_prompt(event, prompts::POLICY_NOT_PENDING).await;
            return Ok(());
        }

        let mut updated = actor;
        RegistrationStateMachine::apply(&mut updated, &registration_event)?;
        if let Err(err) = self.repository.update(&updated).await {
            return reply_then_fail(
                self.transport.as_ref(),
                event.chat_id,
                prompts::INTERNAL_ERROR,
                err,
            )
            .await;
        }

        match registration_event {
            RegistrationEvent::PolicyAccepted => {
                info!("✅ Policy accepted; registration submitted for review");
                self.close_prompt(event, prompts::POLICY_ACCEPTED_EDIT).await;
                let name = updated.first_name.as_deref().unwrap_or_default();
                self.transport
                    .send_message(prompts::registration_complete(event.chat_id, name))
                    .await?;
            }
            _ => {
                info!("Policy declined; registration restarted");
                self.close_prompt(event, prompts::POLICY_DECLINED_EDIT).await;
                self.transport
                    .send_message(prompts::markdown(event.chat_id, prompts::POLICY_DECLINED))
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryActorRepository;
    use crate::handlers::test_support::callback_event;
    use crate::state_machine::VerificationStatus;
    use crate::test_helpers::RecordingTransport;

    async fn setup(state: ConversationState) -> (PolicyCallback, Arc<InMemoryActorRepository>, Arc<RecordingTransport>, Actor) {
        let repository = Arc::new(InMemoryActorRepository::new());
        let transport = Arc::new(RecordingTransport::new());
        let mut actor = Actor::new_applicant(3);
        actor.first_name = Some("John".to_string());
        actor.last_name = Some("Doe".to_string());
        actor.identity_doc_ref = Some("1001".to_string());
        actor.conversation_state = state;
        repository.create(&actor).await.unwrap();
        let handler = PolicyCallback::new(repository.clone(), transport.clone());
        (handler, repository, transport, actor)
    }

    #[tokio::test]
    async fn test_accept_completes_registration() {
        let (handler, repository, transport, actor) =
            setup(ConversationState::AwaitingPolicyApproval).await;

        handler
            .handle(&callback_event(3, callbacks::POLICY_ACCEPT), actor)
            .await
            .unwrap();

        let stored = repository.get_by_handle(3).await.unwrap().unwrap();
        assert_eq!(stored.conversation_state, ConversationState::None);
        assert_eq!(stored.verification_status, VerificationStatus::Pending);
        assert_eq!(stored.first_name.as_deref(), Some("John"));

        assert_eq!(transport.answered_callbacks().len(), 1);
        assert_eq!(transport.edited_texts()[0].text, prompts::POLICY_ACCEPTED_EDIT);
        assert!(transport
            .last_message_text()
            .unwrap()
            .contains("Registration Complete"));
    }

    #[tokio::test]
    async fn test_decline_blanks_profile() {
        let (handler, repository, transport, actor) =
            setup(ConversationState::AwaitingPolicyApproval).await;

        handler
            .handle(&callback_event(3, callbacks::POLICY_DECLINE), actor)
            .await
            .unwrap();

        let stored = repository.get_by_handle(3).await.unwrap().unwrap();
        assert_eq!(stored.conversation_state, ConversationState::AwaitingFirstName);
        assert!(stored.has_blank_profile());
        assert_eq!(
            transport.last_message_text().as_deref(),
            Some(prompts::POLICY_DECLINED)
        );
    }

    #[tokio::test]
    async fn test_stale_button_changes_nothing() {
        let (handler, repository, transport, actor) = setup(ConversationState::None).await;

        handler
            .handle(&callback_event(3, callbacks::POLICY_DECLINE), actor.clone())
            .await
            .unwrap();

        let stored = repository.get_by_handle(3).await.unwrap().unwrap();
        assert_eq!(stored, actor);
        assert_eq!(transport.edited_texts()[0].text, prompts::POLICY_NOT_PENDING);
        assert!(transport.sent_messages().is_empty());
    }
}
