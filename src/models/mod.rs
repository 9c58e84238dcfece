//! # Data Models
//!
//! Domain records and value types shared across the relay: the [`Actor`]
//! record, the normalized [`CanonicalEvent`], the relayed
//! [`VerificationEvent`] and the outbound message parameters.

pub mod actor;
pub mod canonical_event;
pub mod outbound;
pub mod verification;

pub use actor::Actor;
pub use canonical_event::{CanonicalEvent, EventKind, MessageContent, PhotoAttachment, SharedContact};
pub use outbound::{
    escape_markdown, AnswerCallbackParams, Button, EditMessageCaptionParams,
    EditMessageTextParams, MessageBuilder, ParseMode, ReplyMarkup, SendMessageParams,
    SendPhotoParams,
};
pub use verification::VerificationEvent;
