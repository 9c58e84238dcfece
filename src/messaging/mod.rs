//! # Verification Queue
//!
//! The hand-off between the applicant pool and the reviewer pool.
//! [`VerificationQueue`] is the two-method contract; [`ChannelQueue`] fulfils it
//! by posting artifacts into a relay channel and listening for those posts on
//! the event bus. A durable broker can replace it behind the same trait.

pub mod caption;
pub mod channel_queue;
pub mod errors;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::VerificationEvent;

pub use caption::{build_relay_caption, parse_actor_id};
pub use channel_queue::ChannelQueue;
pub use errors::{QueueError, QueueResult};

/// Consumer of relayed verification events
#[async_trait]
pub trait VerificationHandler: Send + Sync {
    async fn handle_verification(&self, event: VerificationEvent) -> QueueResult<()>;
}

#[async_trait]
pub trait VerificationQueue: Send + Sync {
    /// Relay the artifact, returning an opaque reference for later audit
    async fn publish(&self, event: &VerificationEvent) -> QueueResult<String>;

    /// Deliver future relayed artifacts to `handler`, best-effort
    fn subscribe(&self, handler: Arc<dyn VerificationHandler>) -> QueueResult<()>;
}
