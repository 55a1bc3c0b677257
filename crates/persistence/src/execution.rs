//! Durable storage port for [`ExecutionState`].
//!
//! The scheduler's [`nebula_execution::StateManager`] is the live, in-memory
//! registry a running process consults on the hot path. This repository is
//! the durability boundary behind it: whatever calls `save` is responsible
//! for making an execution's state survive a process restart between
//! suspensions, and for answering the batch queries the archival sweep needs
//! (fetching terminal executions older than a configured age).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_core::ExecutionId;
use nebula_execution::ExecutionState;

use crate::error::PersistenceError;

/// Repository port for durable [`ExecutionState`] storage.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Insert or overwrite an execution's state.
    async fn save(&self, state: ExecutionState) -> Result<(), PersistenceError>;

    /// Fetch an execution's state by id.
    async fn get(&self, execution_id: ExecutionId) -> Result<Option<ExecutionState>, PersistenceError>;

    /// List every stored execution. Used by `apps/cli`'s `listExecutions`.
    async fn list(&self) -> Result<Vec<ExecutionState>, PersistenceError>;

    /// Find executions in a terminal state whose `completed_at` is before
    /// `cutoff` — the archival sweep's batch-selection query.
    async fn find_completed_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExecutionState>, PersistenceError>;

    /// Remove an execution's durable record. Called once its archive has
    /// been written.
    async fn delete(&self, execution_id: ExecutionId) -> Result<(), PersistenceError>;
}

/// In-memory [`ExecutionRepository`] reference implementation, backed by a
/// [`DashMap`] for lock-free concurrent access across workers.
#[derive(Debug, Default)]
pub struct InMemoryExecutionRepository {
    executions: DashMap<ExecutionId, ExecutionState>,
}

impl InMemoryExecutionRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored executions. Mostly useful in tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executions.len()
    }

    /// Returns `true` if no executions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn save(&self, state: ExecutionState) -> Result<(), PersistenceError> {
        self.executions.insert(state.execution_id, state);
        Ok(())
    }

    async fn get(&self, execution_id: ExecutionId) -> Result<Option<ExecutionState>, PersistenceError> {
        Ok(self.executions.get(&execution_id).map(|e| e.clone()))
    }

    async fn list(&self) -> Result<Vec<ExecutionState>, PersistenceError> {
        Ok(self.executions.iter().map(|e| e.clone()).collect())
    }

    async fn find_completed_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExecutionState>, PersistenceError> {
        Ok(self
            .executions
            .iter()
            .filter(|e| e.status.is_terminal() && e.completed_at.is_some_and(|at| at < cutoff))
            .map(|e| e.clone())
            .collect())
    }

    async fn delete(&self, execution_id: ExecutionId) -> Result<(), PersistenceError> {
        self.executions.remove(&execution_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{NodeId, WorkflowId};
    use nebula_execution::ExecutionStatus;

    fn make_state() -> ExecutionState {
        ExecutionState::new(ExecutionId::v4(), WorkflowId::v4(), &[NodeId::v4()])
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let repo = InMemoryExecutionRepository::new();
        let state = make_state();
        let id = state.execution_id;
        repo.save(state).await.unwrap();

        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.execution_id, id);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = InMemoryExecutionRepository::new();
        assert!(repo.get(ExecutionId::v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_all() {
        let repo = InMemoryExecutionRepository::new();
        repo.save(make_state()).await.unwrap();
        repo.save(make_state()).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_completed_before_filters_by_status_and_time() {
        let repo = InMemoryExecutionRepository::new();

        let mut running = make_state();
        running.transition_status(ExecutionStatus::Running).unwrap();
        repo.save(running).await.unwrap();

        let mut completed = make_state();
        completed.transition_status(ExecutionStatus::Running).unwrap();
        completed.transition_status(ExecutionStatus::Completed).unwrap();
        repo.save(completed).await.unwrap();

        let cutoff = Utc::now() + chrono::Duration::hours(1);
        let found = repo.find_completed_before(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = InMemoryExecutionRepository::new();
        let state = make_state();
        let id = state.execution_id;
        repo.save(state).await.unwrap();

        repo.delete(id).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(repo.is_empty());
    }
}
