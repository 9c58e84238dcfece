use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::prompts;
use crate::config::CountryStrategy;
use crate::constants::callbacks;
use crate::database::ActorRepository;
use crate::logging::log_queue_operation;
use crate::messaging::{QueueError, QueueResult, VerificationHandler};
use crate::models::{
    escape_markdown, Actor, Button, ParseMode, ReplyMarkup, SendPhotoParams, VerificationEvent,
};
use crate::transport::ChatTransport;

/// Posts relayed verification artifacts into the review channel with
/// approve/reject buttons.
pub struct ForwardingHandler {
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
    review_channel_id: i64,
    countries: BTreeMap<String, CountryStrategy>,
}

impl ForwardingHandler {
    pub fn new(
        repository: Arc<dyn ActorRepository>,
        transport: Arc<dyn ChatTransport>,
        review_channel_id: i64,
        countries: BTreeMap<String, CountryStrategy>,
    ) -> Self {
        Self {
            repository,
            transport,
            review_channel_id,
            countries,
        }
    }

    /// MarkdownV2 caption shown to reviewers
    pub fn review_caption(&self, actor: &Actor) -> String {
        let mut caption = format!("*User for Review*\nID: `{}`\n\n", actor.id);
        let fields = [
            ("First Name", actor.first_name.as_deref(), false),
            ("Last Name", actor.last_name.as_deref(), false),
            ("Phone", actor.phone_number.as_deref(), true),
            ("Gov ID", actor.government_id.as_deref(), true),
        ];
        for (label, value, as_code) in fields {
            let Some(value) = value else { continue };
            let _ = if as_code {
                writeln!(caption, "*{label}:* `{}`", prompts::escape_code(value))
            } else {
                writeln!(caption, "*{label}:* {}", escape_markdown(value))
            };
        }
        if let Some(code) = actor.location_country.as_deref() {
            let title = self
                .countries
                .get(code)
                .map(|c| c.title.as_str())
                .unwrap_or(code);
            let _ = writeln!(caption, "*Country:* {}", escape_markdown(title));
        }
        caption
    }

    fn review_buttons(actor: &Actor) -> ReplyMarkup {
        ReplyMarkup::Inline(vec![vec![
            Button::callback(
                prompts::APPROVE_BUTTON,
                callbacks::approval_payload(callbacks::APPROVAL_ACCEPT, &actor.id),
            ),
            Button::callback(
                prompts::REJECT_BUTTON,
                callbacks::approval_payload(callbacks::APPROVAL_REJECT, &actor.id),
            ),
        ]])
    }
}

#[async_trait]
impl VerificationHandler for ForwardingHandler {
    #[instrument(skip(self, event), fields(actor_id = %event.actor_id))]
    async fn handle_verification(&self, event: VerificationEvent) -> QueueResult<()> {
        let actor = self
            .repository
            .get_by_id(event.actor_id)
            .await
            .map_err(|e| QueueError::handler(format!("actor lookup failed: {e}")))?;
        let Some(actor) = actor else {
            warn!("Relayed artifact refers to an unknown actor; dropping");
            return Ok(());
        };

        let params = SendPhotoParams {
            chat_id: self.review_channel_id,
            file_id: event.artifact_ref.clone(),
            caption: self.review_caption(&actor),
            parse_mode: Some(ParseMode::MarkdownV2),
            reply_markup: Some(Self::review_buttons(&actor)),
        };
        let message_id = self.transport.send_photo(params).await?;

        log_queue_operation("forward", Some(&actor.id), "delivered", None);
        info!(message_id, review_channel_id = self.review_channel_id, "📨 Forwarded for review");
        Ok(())
    }
}
