//! # Handlers
//!
//! Business handlers plugged into the routers.
//!
//! Applicant pool: [`StartCommand`], [`RegistrationHandler`], [`PolicyCallback`].
//! Reviewer pool: [`ApprovalCallback`].
//! Queue and bus consumers: [`ForwardingHandler`], [`subscribe_notifications`].

pub mod approval;
pub mod errors;
pub mod forwarding;
pub mod notification;
pub mod policy;
pub mod prompts;
pub mod registration;
pub mod start;

use tracing::warn;

use crate::transport::ChatTransport;

// Re-export main types for easy access
pub use approval::{parse_approval_payload, ApprovalCallback, ReviewDecision};
pub use errors::{HandlerError, HandlerResult};
pub use forwarding::ForwardingHandler;
pub use notification::subscribe_notifications;
pub use policy::PolicyCallback;
pub use registration::RegistrationHandler;
pub use start::StartCommand;

/// Tell the actor something went wrong, then report the underlying error
pub(crate) async fn reply_then_fail(
    transport: &dyn ChatTransport,
    chat_id: i64,
    text: &str,
    error: impl Into<HandlerError>,
) -> HandlerResult {
    if let Err(send_error) = transport.send_message(prompts::plain(chat_id, text)).await {
        warn!(chat_id, error = %send_error, "Failed to send error reply");
    }
    Err(error.into())
}
