use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use super::errors::HandlerResult;
use super::{prompts, reply_then_fail};
use crate::constants::commands;
use crate::database::ActorRepository;
use crate::models::{Actor, CanonicalEvent, MessageBuilder};
use crate::registry::CommandHandler;
use crate::state_machine::{RegistrationEvent, RegistrationStateMachine, VerificationStatus};
use crate::transport::ChatTransport;

/// `/start`: create the applicant on first contact, otherwise resume
/// wherever their record says they are.
pub struct StartCommand {
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
    country_titles: Vec<String>,
}

impl StartCommand {
    pub fn new(
        repository: Arc<dyn ActorRepository>,
        transport: Arc<dyn ChatTransport>,
        machine: &RegistrationStateMachine,
    ) -> Self {
        Self {
            repository,
            transport,
            country_titles: machine.guards().country_titles(),
        }
    }

    async fn register(&self, event: &CanonicalEvent) -> HandlerResult {
        let actor = Actor::new_applicant(event.actor_handle);
        if let Err(err) = self.repository.create(&actor).await {
            return reply_then_fail(
                self.transport.as_ref(),
                event.chat_id,
                prompts::INTERNAL_ERROR_RETRY,
                err,
            )
            .await;
        }
        info!(actor_id = %actor.id, actor_handle = actor.handle, "✅ New applicant registered");
        self.transport.send_message(prompts::welcome(event.chat_id)).await?;
        Ok(())
    }

    async fn restart(&self, event: &CanonicalEvent, mut actor: Actor) -> HandlerResult {
        RegistrationStateMachine::apply(&mut actor, &RegistrationEvent::Started)?;
        if let Err(err) = self.repository.update(&actor).await {
            return reply_then_fail(
                self.transport.as_ref(),
                event.chat_id,
                prompts::INTERNAL_ERROR_RETRY,
                err,
            )
            .await;
        }
        info!(actor_id = %actor.id, "Rejected applicant restarting registration");
        let params = MessageBuilder::new(event.chat_id)
            .text(prompts::REGISTRATION_RESTARTED)
            .remove_keyboard()
            .build();
        self.transport.send_message(params).await?;
        Ok(())
    }

    async fn resume(&self, event: &CanonicalEvent, actor: &Actor) -> HandlerResult {
        let params = match prompts::state_prompt(
            event.chat_id,
            actor.conversation_state,
            &self.country_titles,
        ) {
            Some(prompt) => prompt,
            None => prompts::pending_verification(event.chat_id, actor.first_name.as_deref()),
        };
        self.transport.send_message(params).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for StartCommand {
    fn command(&self) -> &str {
        commands::START
    }

    fn name(&self) -> &str {
        "start_command"
    }

    #[instrument(skip(self, event), fields(actor_handle = event.actor_handle))]
    async fn handle(&self, event: &CanonicalEvent) -> HandlerResult {
        let existing = match self.repository.get_by_handle(event.actor_handle).await {
            Ok(existing) => existing,
            Err(err) => {
                return reply_then_fail(
                    self.transport.as_ref(),
                    event.chat_id,
                    prompts::INTERNAL_ERROR_RETRY,
                    err,
                )
                .await
            }
        };

        let Some(actor) = existing else {
            return self.register(event).await;
        };

        match actor.verification_status {
            VerificationStatus::Approved => {
                let name = actor.first_name.as_deref().unwrap_or_default();
                self.transport
                    .send_message(prompts::welcome_back(event.chat_id, name))
                    .await?;
                Ok(())
            }
            VerificationStatus::Rejected => self.restart(event, actor).await,
            VerificationStatus::Pending => self.resume(event, &actor).await,
        }
    }
}
