//! # Router
//!
//! One router per actor pool. Each inbound update is classified and then
//! dispatched in a fixed order:
//!
//! 1. Commands, by exact name. A matched command ends dispatch whatever its outcome.
//! 2. Actor resolution by transport handle.
//! 3. Reviewer authorization, when the pool enforces it. Failures are silent.
//! 4. Callback payloads, first matching prefix.
//! 5. Everything else goes to the pool's single message handler.
//!
//! Handler failures are logged with the actor and handler name and swallowed;
//! one bad update never stops the ingestion loop.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::classifier::classify;
use crate::database::{ActorRepository, RepositoryError};
use crate::handlers::HandlerError;
use crate::logging::{log_dispatch_operation, log_error};
use crate::models::{Actor, AnswerCallbackParams, CanonicalEvent, EventKind, MessageBuilder};
use crate::registry::{HandlerRegistry, RouteTable};
use crate::transport::{ChatTransport, RawUpdate, TransportError};

pub const BEGIN_REGISTRATION_PROMPT: &str = "Please type /start to begin\\.";
pub const INTERNAL_ERROR_REPLY: &str = "An internal error occurred.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Router for pool '{pool}' is missing its {component}")]
    MissingComponent { pool: String, component: String },

    #[error("Actor lookup failed: {0}")]
    ActorLookup(#[from] RepositoryError),

    #[error("Handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },

    #[error("Reply failed: {0}")]
    Reply(#[from] TransportError),
}

impl RouterError {
    pub fn missing_component(pool: impl Into<String>, component: impl Into<String>) -> Self {
        Self::MissingComponent {
            pool: pool.into(),
            component: component.into(),
        }
    }

    fn handler(handler: &str, source: HandlerError) -> Self {
        Self::Handler {
            handler: handler.to_string(),
            source,
        }
    }
}

/// How an update left the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The classifier did not recognise the update
    Unsupported,
    /// A handler ran to completion
    Handled { handler: String },
    /// The actor is not a reviewer; nothing was sent
    Unauthorized,
    /// No actor record yet; the begin-registration prompt was sent
    NotRegistered,
    /// No callback prefix matched
    NoCallbackHandler,
    /// Free-form content arrived but the pool has no message handler
    NoMessageHandler,
    /// Handed to the event bus instead of a handler
    Published { topic: String, deliveries: usize },
    /// Something failed; already logged
    Failed,
}

/// Anything that can take a raw update off a worker
#[async_trait]
pub trait UpdateProcessor: Send + Sync {
    async fn process(&self, update: RawUpdate) -> DispatchOutcome;
}

pub struct Router {
    pool: String,
    routes: RouteTable,
    repository: Arc<dyn ActorRepository>,
    transport: Arc<dyn ChatTransport>,
    require_reviewer: bool,
}

// Manual Debug implementation because handlers and collaborators are trait objects
impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("pool", &self.pool)
            .field("routes", &self.routes)
            .field("require_reviewer", &self.require_reviewer)
            .finish()
    }
}

impl Router {
    pub fn builder(pool: impl Into<String>) -> RouterBuilder {
        RouterBuilder::new(pool)
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Route one canonical event
    #[instrument(skip(self, event), fields(pool = %self.pool, actor_handle = event.actor_handle, kind = event.kind_name()))]
    pub async fn dispatch(&self, event: CanonicalEvent) -> DispatchOutcome {
        match self.route(&event).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let context = format!(
                    "pool={} actor_handle={} kind={}",
                    self.pool,
                    event.actor_handle,
                    event.kind_name()
                );
                log_error("router", "dispatch", &err.to_string(), Some(&context));
                log_dispatch_operation(
                    &self.pool,
                    Some(event.actor_handle),
                    event.kind_name(),
                    None,
                    "failed",
                );
                DispatchOutcome::Failed
            }
        }
    }

    async fn route(&self, event: &CanonicalEvent) -> Result<DispatchOutcome, RouterError> {
        if let EventKind::Command { name, .. } = &event.kind {
            if let Some(handler) = self.routes.command(name) {
                let handler_name = handler.name().to_string();
                handler
                    .handle(event)
                    .await
                    .map_err(|e| RouterError::handler(&handler_name, e))?;
                return Ok(self.handled(event, handler_name));
            }
            debug!(command = %name, "No handler for command; falling through");
        }

        let actor = match self.repository.get_by_handle(event.actor_handle).await {
            Ok(actor) => actor,
            Err(err) => {
                // Callers of a reviewer pool are unverified; they get no reply at all
                if !self.require_reviewer {
                    self.reply_plain(event.chat_id, INTERNAL_ERROR_REPLY).await;
                }
                return Err(err.into());
            }
        };

        if self.require_reviewer && !actor.as_ref().is_some_and(|a| a.is_reviewer) {
            debug!(actor_handle = event.actor_handle, "Dropping update from non-reviewer");
            log_dispatch_operation(
                &self.pool,
                Some(event.actor_handle),
                event.kind_name(),
                None,
                "unauthorized",
            );
            return Ok(DispatchOutcome::Unauthorized);
        }

        let Some(actor) = actor else {
            if let Some(query_id) = event.callback_query_id() {
                self.transport
                    .answer_callback_query(AnswerCallbackParams::acknowledge(query_id))
                    .await?;
            }
            let prompt = MessageBuilder::new(event.chat_id)
                .text(BEGIN_REGISTRATION_PROMPT)
                .build();
            self.transport.send_message(prompt).await?;
            log_dispatch_operation(
                &self.pool,
                Some(event.actor_handle),
                event.kind_name(),
                None,
                "not_registered",
            );
            return Ok(DispatchOutcome::NotRegistered);
        };

        if let EventKind::Callback { data, .. } = &event.kind {
            let Some(handler) = self.routes.callback(data) else {
                warn!(callback_data = %data, pool = %self.pool, "No handler for callback payload");
                return Ok(DispatchOutcome::NoCallbackHandler);
            };
            let handler_name = handler.name().to_string();
            handler
                .handle(event, actor)
                .await
                .map_err(|e| RouterError::handler(&handler_name, e))?;
            return Ok(self.handled(event, handler_name));
        }

        self.dispatch_message(event, actor).await
    }

    async fn dispatch_message(
        &self,
        event: &CanonicalEvent,
        actor: Actor,
    ) -> Result<DispatchOutcome, RouterError> {
        let Some(handler) = self.routes.message() else {
            debug!(pool = %self.pool, "No message handler registered");
            return Ok(DispatchOutcome::NoMessageHandler);
        };
        let handler_name = handler.name().to_string();
        debug!(
            handler = %handler_name,
            state = %actor.conversation_state,
            "Forwarding to message handler"
        );
        handler
            .handle(event, actor)
            .await
            .map_err(|e| RouterError::handler(&handler_name, e))?;
        Ok(self.handled(event, handler_name))
    }

    fn handled(&self, event: &CanonicalEvent, handler: String) -> DispatchOutcome {
        log_dispatch_operation(
            &self.pool,
            Some(event.actor_handle),
            event.kind_name(),
            Some(&handler),
            "handled",
        );
        DispatchOutcome::Handled { handler }
    }

    async fn reply_plain(&self, chat_id: i64, text: &str) {
        let params = MessageBuilder::new(chat_id).text(text).plain().build();
        if let Err(err) = self.transport.send_message(params).await {
            warn!(chat_id, error = %err, "Failed to send error reply");
        }
    }
}

#[async_trait]
impl UpdateProcessor for Router {
    async fn process(&self, update: RawUpdate) -> DispatchOutcome {
        match classify(&update) {
            Some(event) => self.dispatch(event).await,
            None => {
                log_dispatch_operation(&self.pool, update.actor_handle(), update.kind(), None, "unsupported");
                DispatchOutcome::Unsupported
            }
        }
    }
}

/// Builder for [`Router`]; the registry is frozen when the router is built
pub struct RouterBuilder {
    pool: String,
    registry: HandlerRegistry,
    repository: Option<Arc<dyn ActorRepository>>,
    transport: Option<Arc<dyn ChatTransport>>,
    require_reviewer: bool,
}

impl RouterBuilder {
    pub fn new(pool: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            registry: HandlerRegistry::new(),
            repository: None,
            transport: None,
            require_reviewer: false,
        }
    }

    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn repository(mut self, repository: Arc<dyn ActorRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Transport used for the router's own replies
    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Only actors flagged as reviewers get past command dispatch
    pub fn require_reviewer(mut self, require: bool) -> Self {
        self.require_reviewer = require;
        self
    }

    pub fn build(self) -> Result<Router, RouterError> {
        let repository = self
            .repository
            .ok_or_else(|| RouterError::missing_component(&self.pool, "repository"))?;
        let transport = self
            .transport
            .ok_or_else(|| RouterError::missing_component(&self.pool, "transport"))?;

        Ok(Router {
            routes: self.registry.freeze(),
            pool: self.pool,
            repository,
            transport,
            require_reviewer: self.require_reviewer,
        })
    }
}
