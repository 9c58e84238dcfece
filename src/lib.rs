#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, MarkdownV2 in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Relay Core Rust
//!
//! Event dispatch and stateful conversation engine for a two-pool chat
//! verification relay.
//!
//! ## Overview
//!
//! Applicants talk to one bot and walk through a registration workflow driven
//! by a persisted per-actor state machine. Their identity document is relayed
//! through a private channel that acts as a durable queue, picked up on the
//! reviewer side, and posted to reviewers with approve/reject buttons. The
//! decision flows back to the applicant through an in-process event bus.
//!
//! ## Module Organization
//!
//! - [`events`] - Topic-keyed in-process publish/subscribe bus
//! - [`messaging`] - Chat channel used as a verification queue
//! - [`registry`] - Command, callback and message handler registration
//! - [`execution`] - Update classification, routing and worker pools
//! - [`state_machine`] - Registration workflow states, guards and transitions
//! - [`handlers`] - Applicant and reviewer business handlers
//! - [`transport`] - Bot API types and the Telegram client
//! - [`database`] - Actor persistence (Postgres and in-memory)
//! - [`security`] - Field encryption for personal data at rest
//! - [`bootstrap`] - Composition root for both pools
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use relay_core::bootstrap::{BotEndpoints, RelaySystem};
//! use relay_core::config::ConfigLoader;
//! use relay_core::database::InMemoryActorRepository;
//! use relay_core::transport::TelegramClient;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let applicant = Arc::new(TelegramClient::new(config.applicant_bot.client_config())?);
//! let reviewer = Arc::new(TelegramClient::new(
//!     config.reviewer_bot.client_config().with_channel_posts(),
//! )?);
//!
//! let system = RelaySystem::build(
//!     config,
//!     Arc::new(InMemoryActorRepository::new()),
//!     BotEndpoints::new(applicant.clone(), applicant),
//!     BotEndpoints::new(reviewer.clone(), reviewer),
//! )?;
//! system.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests (Postgres tests are ignored)
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod execution;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod registry;
pub mod security;
pub mod state_machine;
pub mod test_helpers;
pub mod transport;

pub use bootstrap::{BotEndpoints, RelayRunSummary, RelaySystem};
pub use config::{ConfigLoader, RelayConfig};
pub use error::{RelayError, RelayResult};
pub use events::{EventBus, InMemoryEventBus};
pub use execution::{classify, DispatchOutcome, Router, WorkerPool};
pub use messaging::{ChannelQueue, VerificationQueue};
pub use models::{Actor, CanonicalEvent, VerificationEvent};
pub use registry::HandlerRegistry;
pub use state_machine::{ConversationState, RegistrationStateMachine, VerificationStatus};
