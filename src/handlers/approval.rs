//! Reviewer decision on a forwarded verification post.
//!
//! Payload shape: `approval_<accept|reject>_<actor uuid>`. The decision is
//! persisted first, then announced on the bus so the applicant side can
//! notify the actor, and finally the review post's caption is replaced.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::errors::{HandlerError, HandlerResult};
use super::prompts;
use crate::constants::{callbacks, topics};
use crate::database::ActorRepository;
use crate::events::EventBus;
use crate::models::{Actor, AnswerCallbackParams, CanonicalEvent, EditMessageCaptionParams};
use crate::registry::CallbackHandler;
use crate::state_machine::{RegistrationEvent, RegistrationStateMachine};
use crate::transport::ChatTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    fn event(self) -> RegistrationEvent {
        match self {
            Self::Approve => RegistrationEvent::ReviewApproved,
            Self::Reject => RegistrationEvent::ReviewRejected,
        }
    }

    fn topic(self) -> &'static str {
        match self {
            Self::Approve => topics::ACTOR_APPROVED,
            Self::Reject => topics::ACTOR_REJECTED,
        }
    }
}

/// Split an approval payload into its decision and target actor
pub fn parse_approval_payload(data: &str) -> HandlerResult<(ReviewDecision, Uuid)> {
    let parts: Vec<&str> = data.split('_').collect();
    let [prefix, action, id] = parts.as_slice() else {
        return Err(HandlerError::invalid_callback(
            data,
            "expected exactly three '_'-separated parts",
        ));
    };
    if format!("{prefix}_") != callbacks::APPROVAL_PREFIX {
        return Err(HandlerError::invalid_callback(data, "not an approval payload"));
    }

    let decision = match *action {
        callbacks::APPROVAL_ACCEPT => ReviewDecision::Approve,
        callbacks::APPROVAL_REJECT => ReviewDecision::Reject,
        other => {
            return Err(HandlerError::invalid_callback(
                data,
                format!("unknown action '{other}'"),
            ))
        }
    };
    let actor_id = Uuid::parse_str(id)
        .map_err(|e| HandlerError::invalid_callback(data, format!("invalid actor id: {e}")))?;
    Ok((decision, actor_id))
}

pub struct ApprovalCallback {
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
    bus: Arc<dyn EventBus>,
}

impl ApprovalCallback {
    pub fn new(
        repository: Arc<dyn ActorRepository>,
        transport: Arc<dyn ChatTransport>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            transport,
            bus,
        }
    }

    async fn set_caption(&self, event: &CanonicalEvent, caption: &str) {
        let params = EditMessageCaptionParams {
            chat_id: event.chat_id,
            message_id: event.message_id,
            caption: caption.to_string(),
            parse_mode: None,
        };
        if let Err(err) = self.transport.edit_message_caption(params).await {
            warn!(error = %err, "Failed to edit review caption");
        }
    }
}

#[async_trait]
impl CallbackHandler for ApprovalCallback {
    fn prefix(&self) -> &str {
        callbacks::APPROVAL_PREFIX
    }

    fn name(&self) -> &str {
        "approval_callback"
    }

    #[instrument(skip(self, event, reviewer))]
    async fn handle(&self, event: &CanonicalEvent, reviewer: Actor) -> HandlerResult {
        let query_id = event
            .callback_query_id()
            .ok_or_else(|| HandlerError::missing_payload("callback query id"))?;
        if let Err(err) = self
            .transport
            .answer_callback_query(AnswerCallbackParams::acknowledge(query_id))
            .await
        {
            warn!(error = %err, "Failed to answer approval callback");
        }

        let data = event.callback_data().unwrap_or_default();
        let (decision, actor_id) = parse_approval_payload(data)?;

        let target = match self.repository.get_by_id(actor_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                warn!(%actor_id, "Review target not found");
                self.set_caption(event, prompts::CAPTION_ACTOR_MISSING).await;
                return Ok(());
            }
            Err(err) => {
                self.set_caption(event, prompts::CAPTION_ACTOR_MISSING).await;
                return Err(err.into());
            }
        };

        if !target.verification_status.is_reviewable() {
            info!(%actor_id, status = %target.verification_status, "Actor already reviewed");
            let notice = format!(
                "This user was already reviewed (status: {}).",
                target.verification_status
            );
            self.set_caption(event, &notice).await;
            return Ok(());
        }

        let display_name = target.display_name();
        let mut updated = target;
        RegistrationStateMachine::apply(&mut updated, &decision.event())?;
        if let Err(err) = self.repository.update(&updated).await {
            self.set_caption(event, prompts::CAPTION_UPDATE_FAILED).await;
            return Err(err.into());
        }

        let deliveries = self.bus.publish(decision.topic(), updated.into());
        info!(
            %actor_id,
            reviewer_handle = reviewer.handle,
            ?decision,
            deliveries,
            "✅ Review decision recorded"
        );

        let caption = match decision {
            ReviewDecision::Approve => prompts::approved_caption(&display_name),
            ReviewDecision::Reject => prompts::CAPTION_REJECTED.to_string(),
        };
        self.set_caption(event, &caption).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryActorRepository;
    use crate::events::{event_handler, BusEvent, EventHandlerError, InMemoryEventBus};
    use crate::handlers::test_support::callback_event;
    use crate::state_machine::{ConversationState, VerificationStatus};
    use crate::test_helpers::RecordingTransport;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[test]
    fn test_payload_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_approval_payload(&format!("approval_accept_{id}")).unwrap(),
            (ReviewDecision::Approve, id)
        );
        assert_eq!(
            parse_approval_payload(&format!("approval_reject_{id}")).unwrap(),
            (ReviewDecision::Reject, id)
        );
        assert!(parse_approval_payload("approval_accept").is_err());
        assert!(parse_approval_payload("approval_accept_not-a-uuid").is_err());
        assert!(parse_approval_payload(&format!("approval_maybe_{id}")).is_err());
        assert!(parse_approval_payload(&format!("approval_accept_{id}_extra")).is_err());
    }

    async fn pending_applicant(repository: &InMemoryActorRepository) -> Actor {
        let mut actor = Actor::new_applicant(10);
        actor.first_name = Some("Ada".to_string());
        actor.last_name = Some("Lovelace".to_string());
        actor.phone_number = Some("+441234567890".to_string());
        actor.conversation_state = ConversationState::None;
        repository.create(&actor).await.unwrap();
        actor
    }

    fn capture(bus: &InMemoryEventBus, topic: &str) -> Arc<Mutex<Vec<BusEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(
            topic,
            event_handler(move |event| {
                let sink = sink.clone();
                async move {
                    sink.lock().push(event);
                    Ok::<(), EventHandlerError>(())
                }
            }),
        )
        .unwrap();
        seen
    }

    #[tokio::test]
    async fn test_approve_keeps_profile_and_publishes() {
        let repository = Arc::new(InMemoryActorRepository::new());
        let transport = Arc::new(RecordingTransport::new());
        let bus = Arc::new(InMemoryEventBus::default());
        let approved = capture(&bus, topics::ACTOR_APPROVED);
        let applicant = pending_applicant(&repository).await;
        let handler = ApprovalCallback::new(repository.clone(), transport.clone(), bus.clone());

        let data = callbacks::approval_payload(callbacks::APPROVAL_ACCEPT, &applicant.id);
        handler
            .handle(&callback_event(900, &data), Actor::new_reviewer(900))
            .await
            .unwrap();

        let stored = repository.get_by_id(applicant.id).await.unwrap().unwrap();
        assert_eq!(stored.verification_status, VerificationStatus::Approved);
        assert_eq!(stored.first_name.as_deref(), Some("Ada"));
        assert_eq!(
            transport.edited_captions()[0].caption,
            "✅ User Approved: Ada Lovelace"
        );

        assert!(bus.shutdown(Duration::from_secs(1)).await);
        let seen = approved.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payload.as_actor().map(|a| a.id), Some(applicant.id));
    }

    #[tokio::test]
    async fn test_reject_blanks_profile() {
        let repository = Arc::new(InMemoryActorRepository::new());
        let transport = Arc::new(RecordingTransport::new());
        let bus = Arc::new(InMemoryEventBus::default());
        let applicant = pending_applicant(&repository).await;
        let handler = ApprovalCallback::new(repository.clone(), transport.clone(), bus);

        let data = callbacks::approval_payload(callbacks::APPROVAL_REJECT, &applicant.id);
        handler
            .handle(&callback_event(900, &data), Actor::new_reviewer(900))
            .await
            .unwrap();

        let stored = repository.get_by_id(applicant.id).await.unwrap().unwrap();
        assert_eq!(stored.verification_status, VerificationStatus::Rejected);
        assert_eq!(stored.conversation_state, ConversationState::AwaitingFirstName);
        assert!(stored.has_blank_profile());
        assert_eq!(transport.edited_captions()[0].caption, prompts::CAPTION_REJECTED);
    }

    #[tokio::test]
    async fn test_missing_actor_edits_caption() {
        let repository = Arc::new(InMemoryActorRepository::new());
        let transport = Arc::new(RecordingTransport::new());
        let handler = ApprovalCallback::new(
            repository,
            transport.clone(),
            Arc::new(InMemoryEventBus::default()),
        );

        let data = callbacks::approval_payload(callbacks::APPROVAL_ACCEPT, &Uuid::new_v4());
        handler
            .handle(&callback_event(900, &data), Actor::new_reviewer(900))
            .await
            .unwrap();

        assert_eq!(
            transport.edited_captions()[0].caption,
            prompts::CAPTION_ACTOR_MISSING
        );
    }
}
