//! Bot HTTP API client.
//!
//! Every call is a JSON `POST` to `<api_base_url>/bot<token>/<method>`; the
//! response envelope is `{ "ok": bool, "result": ..., "description": ... }`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::{TransportError, TransportResult};
use super::types::{Message, RawUpdate};
use super::{ChatTransport, UpdateSource};
use crate::models::{
    AnswerCallbackParams, Button, EditMessageCaptionParams, EditMessageTextParams, ParseMode,
    ReplyMarkup, SendMessageParams, SendPhotoParams,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramClientConfig {
    pub token: String,
    pub api_base_url: String,
    /// Long-poll wait passed to `getUpdates`
    pub poll_timeout_seconds: u64,
    /// Update kinds requested from `getUpdates`
    pub allowed_updates: Vec<String>,
}

impl TelegramClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_timeout_seconds: 30,
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        }
    }

    pub fn with_channel_posts(mut self) -> Self {
        if !self.allowed_updates.iter().any(|u| u == "channel_post") {
            self.allowed_updates.push("channel_post".to_string());
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Bot API client implementing both transport seams
pub struct TelegramClient {
    http: reqwest::Client,
    config: TelegramClientConfig,
    next_offset: AtomicI64,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("next_offset", &self.next_offset.load(Ordering::Relaxed))
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: TelegramClientConfig) -> TransportResult<Self> {
        // Request timeout must outlast the long-poll wait
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_seconds + 10))
            .build()
            .map_err(|e| TransportError::http("client_builder", e.to_string()))?;

        Ok(Self {
            http,
            config,
            next_offset: AtomicI64::new(0),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, body: &Value) -> TransportResult<R> {
        debug!(method = %method, "Calling Bot API");

        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::http(method, e.without_url().to_string()))?;

        let envelope: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| TransportError::decode(method, e.without_url().to_string()))?;

        if !envelope.ok {
            return Err(TransportError::api(
                method,
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| TransportError::decode(method, "missing result"))
    }

    /// Drop any configured webhook so long polling receives updates
    pub async fn delete_webhook(&self) -> TransportResult<()> {
        let _: bool = self
            .call("deleteWebhook", &json!({ "drop_pending_updates": false }))
            .await?;
        info!("Webhook deleted successfully");
        Ok(())
    }

    /// Publish the bot's command menu
    pub async fn set_menu_commands(&self, commands: &[(&str, &str)]) -> TransportResult<()> {
        let commands: Vec<Value> = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();
        let _: bool = self
            .call("setMyCommands", &json!({ "commands": commands }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, params: SendMessageParams) -> TransportResult<i64> {
        let mut body = json!({
            "chat_id": params.chat_id,
            "text": params.text,
        });
        apply_formatting(&mut body, params.parse_mode, params.reply_markup.as_ref());

        let message: Message = self.call("sendMessage", &body).await?;
        Ok(message.message_id)
    }

    async fn send_photo(&self, params: SendPhotoParams) -> TransportResult<i64> {
        let mut body = json!({
            "chat_id": params.chat_id,
            "photo": params.file_id,
            "caption": params.caption,
        });
        apply_formatting(&mut body, params.parse_mode, params.reply_markup.as_ref());

        let message: Message = self.call("sendPhoto", &body).await?;
        Ok(message.message_id)
    }

    async fn edit_message_text(&self, params: EditMessageTextParams) -> TransportResult<()> {
        let mut body = json!({
            "chat_id": params.chat_id,
            "message_id": params.message_id,
            "text": params.text,
        });
        apply_formatting(&mut body, params.parse_mode, None);

        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn edit_message_caption(&self, params: EditMessageCaptionParams) -> TransportResult<()> {
        let mut body = json!({
            "chat_id": params.chat_id,
            "message_id": params.message_id,
            "caption": params.caption,
        });
        apply_formatting(&mut body, params.parse_mode, None);

        let _: Value = self.call("editMessageCaption", &body).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, params: AnswerCallbackParams) -> TransportResult<()> {
        let mut body = json!({ "callback_query_id": params.callback_query_id });
        if let Some(text) = params.text {
            body["text"] = json!(text);
        }

        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn poll_updates(&self) -> TransportResult<Vec<RawUpdate>> {
        let offset = self.next_offset.load(Ordering::Acquire);
        let body = json!({
            "offset": offset,
            "timeout": self.config.poll_timeout_seconds,
            "allowed_updates": self.config.allowed_updates,
        });

        let updates: Vec<RawUpdate> = self.call("getUpdates", &body).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.next_offset.store(last + 1, Ordering::Release);
        }
        if updates.len() > 1 {
            debug!(count = updates.len(), "Received update batch");
        }

        Ok(updates)
    }
}

fn apply_formatting(body: &mut Value, parse_mode: Option<ParseMode>, markup: Option<&ReplyMarkup>) {
    if let Some(mode) = parse_mode {
        body["parse_mode"] = json!(mode.to_string());
    }
    if let Some(markup) = markup {
        body["reply_markup"] = render_markup(markup);
    }
}

/// Render keyboard markup in Bot API form
pub fn render_markup(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Inline(rows) => json!({
            "inline_keyboard": rows
                .iter()
                .map(|row| row.iter().map(inline_button).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        }),
        ReplyMarkup::Reply(rows) => json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(reply_button).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
            "one_time_keyboard": true,
        }),
        ReplyMarkup::Remove => json!({ "remove_keyboard": true }),
    }
}

fn inline_button(button: &Button) -> Value {
    let mut value = json!({ "text": button.text });
    if let Some(data) = &button.callback_data {
        value["callback_data"] = json!(data);
    }
    if let Some(url) = &button.url {
        value["url"] = json!(url);
    }
    if button.callback_data.is_none() && button.url.is_none() {
        warn!(text = %button.text, "Inline button without callback data or url");
    }
    value
}

fn reply_button(button: &Button) -> Value {
    if button.request_contact {
        json!({ "text": button.text, "request_contact": true })
    } else {
        json!({ "text": button.text })
    }
}
