//! # Actor Persistence
//!
//! The workflow consumes storage through [`ActorRepository`]; lookups that
//! find nothing return `Ok(None)` rather than an error.
//!
//! ## Key Components
//!
//! - [`postgres`] - SQLx/PostgreSQL repository with encrypted sensitive fields
//! - [`memory`] - DashMap-backed repository for tests and local runs
//! - [`connection`] - Pool construction and migrations

pub mod connection;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Actor;

pub use connection::{connect, DatabaseConnection, MIGRATOR};
pub use memory::InMemoryActorRepository;
pub use postgres::PgActorRepository;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Database error during {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Actor not found: {id}")]
    NotFound { id: Uuid },

    #[error("Actor with handle {handle} already exists")]
    DuplicateHandle { handle: i64 },

    #[error("Field encryption failed: {message}")]
    Encryption { message: String },

    #[error("Corrupt column {column}: {message}")]
    Decode { column: String, message: String },
}

impl RepositoryError {
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<crate::security::SecurityError> for RepositoryError {
    fn from(err: crate::security::SecurityError) -> Self {
        Self::Encryption {
            message: err.to_string(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Create/read/update/delete contract for actor records
#[async_trait]
pub trait ActorRepository: Send + Sync {
    async fn create(&self, actor: &Actor) -> RepositoryResult<()>;

    async fn get_by_handle(&self, handle: i64) -> RepositoryResult<Option<Actor>>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Actor>>;

    /// Overwrite every mutable column; `NotFound` if the row is gone
    async fn update(&self, actor: &Actor) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}
