//! PostgreSQL actor repository.
//!
//! Phone number and government id are encrypted with the injected
//! [`FieldCipher`] before they are bound and decrypted after they are read;
//! a row whose ciphertext fails authentication is reported, never returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{ActorRepository, RepositoryError, RepositoryResult};
use crate::models::Actor;
use crate::security::FieldCipher;

const SELECT_COLUMNS: &str = "id, handle, first_name, last_name, phone_number_enc, \
     government_id_enc, location_country, verification_status, conversation_state, \
     verification_strategy, identity_doc_ref, is_reviewer, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ActorRow {
    id: Uuid,
    handle: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number_enc: Option<String>,
    government_id_enc: Option<String>,
    location_country: Option<String>,
    verification_status: String,
    conversation_state: String,
    verification_strategy: Option<String>,
    identity_doc_ref: Option<String>,
    is_reviewer: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct PgActorRepository {
    pool: PgPool,
    cipher: Arc<dyn FieldCipher>,
}

impl std::fmt::Debug for PgActorRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgActorRepository")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PgActorRepository {
    pub fn new(pool: PgPool, cipher: Arc<dyn FieldCipher>) -> Self {
        Self { pool, cipher }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn seal(&self, value: &Option<String>) -> RepositoryResult<Option<String>> {
        value
            .as_deref()
            .map(|plain| self.cipher.encrypt_text(plain))
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn open(&self, value: Option<String>) -> RepositoryResult<Option<String>> {
        value
            .map(|sealed| self.cipher.decrypt_text(&sealed))
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn into_actor(&self, row: ActorRow) -> RepositoryResult<Actor> {
        Ok(Actor {
            id: row.id,
            handle: row.handle,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: self.open(row.phone_number_enc)?,
            government_id: self.open(row.government_id_enc)?,
            location_country: row.location_country,
            verification_status: row
                .verification_status
                .parse()
                .map_err(|e: String| RepositoryError::decode("verification_status", e))?,
            conversation_state: row
                .conversation_state
                .parse()
                .map_err(|e: String| RepositoryError::decode("conversation_state", e))?,
            verification_strategy: row.verification_strategy,
            identity_doc_ref: row.identity_doc_ref,
            is_reviewer: row.is_reviewer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn fetch_one_by(&self, column: &str, bind: QueryKey) -> RepositoryResult<Option<Actor>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM actors WHERE {column} = $1");
        let query = sqlx::query_as::<_, ActorRow>(&sql);
        let query = match bind {
            QueryKey::Id(id) => query.bind(id),
            QueryKey::Handle(handle) => query.bind(handle),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::database(format!("select by {column}"), e.to_string()))?;

        row.map(|row| self.into_actor(row)).transpose()
    }
}

enum QueryKey {
    Id(Uuid),
    Handle(i64),
}

fn map_write_error(operation: &str, actor: &Actor, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::DuplicateHandle {
            handle: actor.handle,
        },
        _ => RepositoryError::database(operation, err.to_string()),
    }
}

#[async_trait]
impl ActorRepository for PgActorRepository {
    async fn create(&self, actor: &Actor) -> RepositoryResult<()> {
        let phone = self.seal(&actor.phone_number)?;
        let government_id = self.seal(&actor.government_id)?;

        sqlx::query(
            "INSERT INTO actors (id, handle, first_name, last_name, phone_number_enc, \
             government_id_enc, location_country, verification_status, conversation_state, \
             verification_strategy, identity_doc_ref, is_reviewer, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(actor.id)
        .bind(actor.handle)
        .bind(&actor.first_name)
        .bind(&actor.last_name)
        .bind(phone)
        .bind(government_id)
        .bind(&actor.location_country)
        .bind(actor.verification_status.to_string())
        .bind(actor.conversation_state.to_string())
        .bind(&actor.verification_strategy)
        .bind(&actor.identity_doc_ref)
        .bind(actor.is_reviewer)
        .bind(actor.created_at)
        .bind(actor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("insert actor", actor, e))?;

        debug!(actor_id = %actor.id, handle = actor.handle, "Actor created");
        Ok(())
    }

    async fn get_by_handle(&self, handle: i64) -> RepositoryResult<Option<Actor>> {
        self.fetch_one_by("handle", QueryKey::Handle(handle)).await
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Actor>> {
        self.fetch_one_by("id", QueryKey::Id(id)).await
    }

    async fn update(&self, actor: &Actor) -> RepositoryResult<()> {
        let phone = self.seal(&actor.phone_number)?;
        let government_id = self.seal(&actor.government_id)?;

        let result = sqlx::query(
            "UPDATE actors SET first_name = $2, last_name = $3, phone_number_enc = $4, \
             government_id_enc = $5, location_country = $6, verification_status = $7, \
             conversation_state = $8, verification_strategy = $9, identity_doc_ref = $10, \
             is_reviewer = $11, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(actor.id)
        .bind(&actor.first_name)
        .bind(&actor.last_name)
        .bind(phone)
        .bind(government_id)
        .bind(&actor.location_country)
        .bind(actor.verification_status.to_string())
        .bind(actor.conversation_state.to_string())
        .bind(&actor.verification_strategy)
        .bind(&actor.identity_doc_ref)
        .bind(actor.is_reviewer)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("update actor", actor, e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { id: actor.id });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::database("delete actor", e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { id });
        }
        Ok(())
    }
}
