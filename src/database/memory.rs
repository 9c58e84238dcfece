//! In-memory actor repository.
//!
//! Records are stored in the clear. Read and write failures can be injected so
//! the workflow's "persistence failed, state unchanged" path can be exercised.
//!
//! ```rust
//! use relay_core::database::{ActorRepository, InMemoryActorRepository};
//! use relay_core::models::Actor;
//!
//! # tokio_test::block_on(async {
//! let repository = InMemoryActorRepository::new();
//! let actor = Actor::new_applicant(42);
//! repository.create(&actor).await?;
//!
//! let found = repository.get_by_handle(42).await?;
//! assert_eq!(found.map(|a| a.id), Some(actor.id));
//! assert!(repository.get_by_handle(7).await?.is_none());
//! # Ok::<(), relay_core::database::RepositoryError>(())
//! # }).unwrap();
//! ```

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{ActorRepository, RepositoryError, RepositoryResult};
use crate::models::Actor;

#[derive(Debug, Default)]
pub struct InMemoryActorRepository {
    actors: DashMap<Uuid, Actor>,
    handles: DashMap<i64, Uuid>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryActorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent create/update/delete fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent lookup fail until reset
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn check_writable(&self, operation: &str) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::database(operation, "injected write failure"));
        }
        Ok(())
    }

    fn check_readable(&self, operation: &str) -> RepositoryResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::database(operation, "injected read failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ActorRepository for InMemoryActorRepository {
    async fn create(&self, actor: &Actor) -> RepositoryResult<()> {
        self.check_writable("create")?;

        match self.handles.entry(actor.handle) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(RepositoryError::DuplicateHandle {
                    handle: actor.handle,
                })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(actor.id);
            }
        }
        self.actors.insert(actor.id, actor.clone());
        Ok(())
    }

    async fn get_by_handle(&self, handle: i64) -> RepositoryResult<Option<Actor>> {
        self.check_readable("get_by_handle")?;
        let Some(id) = self.handles.get(&handle).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.actors.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Actor>> {
        self.check_readable("get_by_id")?;
        Ok(self.actors.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, actor: &Actor) -> RepositoryResult<()> {
        self.check_writable("update")?;

        let mut stored = self
            .actors
            .get_mut(&actor.id)
            .ok_or(RepositoryError::NotFound { id: actor.id })?;
        let mut updated = actor.clone();
        updated.created_at = stored.created_at;
        *stored = updated;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.check_writable("delete")?;

        let (_, actor) = self
            .actors
            .remove(&id)
            .ok_or(RepositoryError::NotFound { id })?;
        self.handles.remove(&actor.handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::ConversationState;

    #[tokio::test]
    async fn test_crud_and_not_found_semantics() {
        let repo = InMemoryActorRepository::new();
        let mut actor = Actor::new_applicant(7);

        assert!(repo.get_by_handle(7).await.unwrap().is_none());
        repo.create(&actor).await.unwrap();
        assert_eq!(repo.get_by_handle(7).await.unwrap().unwrap().id, actor.id);

        actor.conversation_state = ConversationState::AwaitingLastName;
        repo.update(&actor).await.unwrap();
        assert_eq!(
            repo.get_by_id(actor.id).await.unwrap().unwrap().conversation_state,
            ConversationState::AwaitingLastName
        );

        repo.delete(actor.id).await.unwrap();
        assert!(repo.get_by_id(actor.id).await.unwrap().is_none());
        assert!(repo.get_by_handle(7).await.unwrap().is_none());
        assert_eq!(
            repo.update(&actor).await,
            Err(RepositoryError::NotFound { id: actor.id })
        );
    }

    #[tokio::test]
    async fn test_duplicate_handle_rejected() {
        let repo = InMemoryActorRepository::new();
        repo.create(&Actor::new_applicant(9)).await.unwrap();
        assert_eq!(
            repo.create(&Actor::new_applicant(9)).await,
            Err(RepositoryError::DuplicateHandle { handle: 9 })
        );
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let repo = InMemoryActorRepository::new();
        let actor = Actor::new_applicant(3);
        repo.create(&actor).await.unwrap();

        repo.set_fail_writes(true);
        assert!(matches!(
            repo.update(&actor).await,
            Err(RepositoryError::Database { .. })
        ));
        repo.set_fail_writes(false);
        assert!(repo.update(&actor).await.is_ok());
    }
}
