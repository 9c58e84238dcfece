//! # Chat Transport
//!
//! Seams to the chat platform: [`ChatTransport`] for outbound calls and
//! [`UpdateSource`] for the inbound update stream. [`telegram::TelegramClient`]
//! implements both against the Bot HTTP API.

pub mod errors;
pub mod telegram;
pub mod types;

use async_trait::async_trait;

use crate::models::{
    AnswerCallbackParams, EditMessageCaptionParams, EditMessageTextParams, SendMessageParams,
    SendPhotoParams,
};

pub use errors::{TransportError, TransportResult};
pub use telegram::{TelegramClient, TelegramClientConfig};
pub use types::RawUpdate;

/// Outbound operations a handler may perform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, returning the new message id
    async fn send_message(&self, params: SendMessageParams) -> TransportResult<i64>;

    /// Send an already-uploaded photo, returning the new message id
    async fn send_photo(&self, params: SendPhotoParams) -> TransportResult<i64>;

    async fn edit_message_text(&self, params: EditMessageTextParams) -> TransportResult<()>;

    async fn edit_message_caption(&self, params: EditMessageCaptionParams) -> TransportResult<()>;

    async fn answer_callback_query(&self, params: AnswerCallbackParams) -> TransportResult<()>;
}

/// Inbound update stream
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for the next batch of updates; an empty batch is a poll timeout
    async fn poll_updates(&self) -> TransportResult<Vec<RawUpdate>>;
}
