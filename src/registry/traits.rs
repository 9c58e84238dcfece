//! Handler plugin contracts.
//!
//! A router owns at most one handler per command name, an ordered list of
//! callback prefixes, and a single free-form message handler.

use async_trait::async_trait;

use crate::handlers::HandlerResult;
use crate::models::{Actor, CanonicalEvent};

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name without the leading slash, matched exactly
    fn command(&self) -> &str;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Commands run before actor resolution and receive no actor
    async fn handle(&self, event: &CanonicalEvent) -> HandlerResult;
}

#[async_trait]
pub trait CallbackHandler: Send + Sync {
    /// Payload prefix; must not be a prefix of any other registered prefix
    fn prefix(&self) -> &str;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, event: &CanonicalEvent, actor: Actor) -> HandlerResult;
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Free-form content, interpreted against the actor's conversation state
    async fn handle(&self, event: &CanonicalEvent, actor: Actor) -> HandlerResult;
}
