//! # Outbound Message Parameters
//!
//! Structured parameters for every send/edit/answer call the handlers make,
//! plus a builder that fills in the common defaults.
//!
//! ## Usage
//!
//! ```rust
//! use relay_core::models::outbound::{Button, MessageBuilder, ReplyMarkup};
//!
//! let params = MessageBuilder::new(42)
//!     .text("Do you accept these terms\\?")
//!     .inline_buttons(vec![vec![
//!         Button::callback("✅ I Accept", "policy_accept"),
//!         Button::callback("❌ I Decline", "policy_decline"),
//!     ]])
//!     .build();
//!
//! assert!(matches!(params.reply_markup, Some(ReplyMarkup::Inline(_))));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text formatting mode understood by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    Html,
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkdownV2 => write!(f, "MarkdownV2"),
            Self::Html => write!(f, "HTML"),
        }
    }
}

/// One keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub callback_data: Option<String>,
    pub url: Option<String>,
    pub request_contact: bool,
}

impl Button {
    /// Reply-keyboard button that sends its label as text
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            text: label.into(),
            callback_data: None,
            url: None,
            request_contact: false,
        }
    }

    /// Inline button that answers with a callback payload
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            callback_data: Some(data.into()),
            ..Self::text(label)
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::text(label)
        }
    }

    /// Reply-keyboard button that shares the pressing user's own contact
    pub fn contact(label: impl Into<String>) -> Self {
        Self {
            request_contact: true,
            ..Self::text(label)
        }
    }
}

/// Keyboard attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyMarkup {
    /// Buttons attached to the message itself
    Inline(Vec<Vec<Button>>),
    /// Buttons replacing the actor's keyboard
    Reply(Vec<Vec<Button>>),
    /// Remove any reply keyboard
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPhotoParams {
    pub chat_id: i64,
    /// Transport file handle of an already-uploaded photo
    pub file_id: String,
    pub caption: String,
    pub parse_mode: Option<ParseMode>,
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMessageTextParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

/// Caption edits always drop the inline keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMessageCaptionParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub caption: String,
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCallbackParams {
    pub callback_query_id: String,
    pub text: Option<String>,
}

impl AnswerCallbackParams {
    pub fn acknowledge(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
        }
    }
}

/// Builder for [`SendMessageParams`], MarkdownV2 by default
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    params: SendMessageParams,
}

impl MessageBuilder {
    pub fn new(chat_id: i64) -> Self {
        Self {
            params: SendMessageParams {
                chat_id,
                text: String::new(),
                parse_mode: Some(ParseMode::MarkdownV2),
                reply_markup: None,
            },
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.params.text = text.into();
        self
    }

    pub fn parse_mode(mut self, mode: Option<ParseMode>) -> Self {
        self.params.parse_mode = mode;
        self
    }

    /// Send as unformatted text
    pub fn plain(self) -> Self {
        self.parse_mode(None)
    }

    pub fn remove_keyboard(mut self) -> Self {
        self.params.reply_markup = Some(ReplyMarkup::Remove);
        self
    }

    /// Single-button reply keyboard asking for the actor's own contact
    pub fn contact_button(mut self, label: impl Into<String>) -> Self {
        self.params.reply_markup = Some(ReplyMarkup::Reply(vec![vec![Button::contact(label)]]));
        self
    }

    pub fn inline_buttons(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.params.reply_markup = Some(ReplyMarkup::Inline(rows));
        self
    }

    /// Lay labels out as a reply keyboard, `columns` per row; the last row may be short
    pub fn reply_buttons<I, S>(mut self, labels: I, columns: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buttons: Vec<Button> = labels.into_iter().map(Button::text).collect();
        let rows = buttons
            .chunks(columns.max(1))
            .map(<[Button]>::to_vec)
            .collect();
        self.params.reply_markup = Some(ReplyMarkup::Reply(rows));
        self
    }

    pub fn build(self) -> SendMessageParams {
        self.params
    }
}

/// Escape every MarkdownV2 reserved character
pub fn escape_markdown(input: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];

    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
