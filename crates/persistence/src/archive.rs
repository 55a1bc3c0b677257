//! Durable archive records and their storage port.
//!
//! An [`ExecutionArchive`] is a denormalized snapshot of a terminal
//! execution, written once by the archival sweep and never mutated again.
//! Denormalizing (copying the flow name/version and every node's output
//! alongside the execution rather than joining against live tables) is
//! deliberate: by the time an execution is archived, the workflow it ran
//! may have since been edited or deleted, and the archive must still read
//! back faithfully.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_core::{ArchiveId, ExecutionId, NodeId, WorkflowId};
use nebula_execution::{ExecutionStatus, NodeOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::PersistenceError;

/// A single node's denormalized record within an [`ExecutionArchive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedNode {
    /// The node's id.
    pub node_id: NodeId,
    /// The node's final output, if it produced one.
    pub output: Option<NodeOutput>,
    /// Number of attempts made to execute this node.
    pub attempt_count: usize,
    /// Error message, if the node failed.
    pub error_message: Option<String>,
}

/// A denormalized, immutable snapshot of a completed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionArchive {
    /// Unique id for this archive record.
    pub archive_id: ArchiveId,
    /// The execution this archives.
    pub execution_id: ExecutionId,
    /// The workflow that was executed.
    pub workflow_id: WorkflowId,
    /// The workflow's name at the time of execution.
    pub workflow_name: String,
    /// The workflow's version at the time of execution.
    pub workflow_version: u32,
    /// The execution's terminal status.
    pub status: ExecutionStatus,
    /// Denormalized per-node records.
    pub nodes: Vec<ArchivedNode>,
    /// The execution's final output, if any (the output of its terminal node).
    pub final_output: Option<NodeOutput>,
    /// When the execution was created.
    pub created_at: DateTime<Utc>,
    /// When the execution started running.
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution reached its terminal state.
    pub completed_at: DateTime<Utc>,
    /// When this archive record was written.
    pub archived_at: DateTime<Utc>,
}

impl ExecutionArchive {
    /// Total wall-clock duration of the execution, if it ever started.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.started_at.map(|started| self.completed_at - started)
    }
}

/// Repository port for durable [`ExecutionArchive`] storage.
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Insert an archive record. Archives are write-once; callers should
    /// not call `save` twice for the same `execution_id`.
    async fn save(&self, archive: ExecutionArchive) -> Result<(), PersistenceError>;

    /// Fetch an archive by execution id.
    async fn get(&self, execution_id: ExecutionId) -> Result<Option<ExecutionArchive>, PersistenceError>;

    /// Find archives written before `cutoff` — the retention-purge's
    /// batch-selection query.
    async fn find_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<ExecutionArchive>, PersistenceError>;

    /// Remove an archive record permanently.
    async fn delete(&self, execution_id: ExecutionId) -> Result<(), PersistenceError>;
}

/// In-memory [`ArchiveRepository`] reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryArchiveRepository {
    archives: DashMap<ExecutionId, ExecutionArchive>,
}

impl InMemoryArchiveRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Returns `true` if no archives are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

#[async_trait]
impl ArchiveRepository for InMemoryArchiveRepository {
    async fn save(&self, archive: ExecutionArchive) -> Result<(), PersistenceError> {
        self.archives.insert(archive.execution_id, archive);
        Ok(())
    }

    async fn get(&self, execution_id: ExecutionId) -> Result<Option<ExecutionArchive>, PersistenceError> {
        Ok(self.archives.get(&execution_id).map(|a| a.clone()))
    }

    async fn find_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<ExecutionArchive>, PersistenceError> {
        Ok(self
            .archives
            .iter()
            .filter(|a| a.archived_at < cutoff)
            .map(|a| a.clone())
            .collect())
    }

    async fn delete(&self, execution_id: ExecutionId) -> Result<(), PersistenceError> {
        self.archives.remove(&execution_id);
        Ok(())
    }
}

/// Build an [`ExecutionArchive`] from a completed execution's live state.
///
/// `node_outputs` is a snapshot such as
/// [`nebula_execution::StateManager::get_execution_output`] returns;
/// `error_messages`/`attempt_counts` come from each node's
/// [`nebula_execution::NodeExecutionState`].
#[must_use]
pub fn build_archive(
    execution_id: ExecutionId,
    workflow_id: WorkflowId,
    workflow_name: impl Into<String>,
    workflow_version: u32,
    status: ExecutionStatus,
    node_ids: &[NodeId],
    node_outputs: &HashMap<NodeId, NodeOutput>,
    attempt_counts: &HashMap<NodeId, usize>,
    error_messages: &HashMap<NodeId, String>,
    final_output: Option<NodeOutput>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: DateTime<Utc>,
) -> ExecutionArchive {
    let nodes = node_ids
        .iter()
        .map(|&node_id| ArchivedNode {
            node_id,
            output: node_outputs.get(&node_id).cloned(),
            attempt_count: attempt_counts.get(&node_id).copied().unwrap_or(0),
            error_message: error_messages.get(&node_id).cloned(),
        })
        .collect();

    ExecutionArchive {
        archive_id: ArchiveId::v4(),
        execution_id,
        workflow_id,
        workflow_name: workflow_name.into(),
        workflow_version,
        status,
        nodes,
        final_output,
        created_at,
        started_at,
        completed_at,
        archived_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_archive(completed_at: DateTime<Utc>) -> ExecutionArchive {
        build_archive(
            ExecutionId::v4(),
            WorkflowId::v4(),
            "my-flow",
            1,
            ExecutionStatus::Completed,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            None,
            Utc::now(),
            Some(Utc::now()),
            completed_at,
        )
    }

    #[test]
    fn duration_computed_when_started() {
        let started = Utc::now();
        let completed = started + chrono::Duration::seconds(5);
        let archive = ExecutionArchive {
            started_at: Some(started),
            completed_at: completed,
            ..make_archive(completed)
        };
        assert_eq!(archive.duration(), Some(chrono::Duration::seconds(5)));
    }

    #[test]
    fn duration_none_when_never_started() {
        let archive = ExecutionArchive {
            started_at: None,
            ..make_archive(Utc::now())
        };
        assert!(archive.duration().is_none());
    }

    #[test]
    fn build_archive_denormalizes_node_records() {
        let node_id = NodeId::v4();
        let mut outputs = HashMap::new();
        outputs.insert(
            node_id,
            NodeOutput::inline(serde_json::json!(42), nebula_workflow::NodeState::Completed, 2),
        );
        let mut attempts = HashMap::new();
        attempts.insert(node_id, 2usize);

        let archive = build_archive(
            ExecutionId::v4(),
            WorkflowId::v4(),
            "flow",
            3,
            ExecutionStatus::Completed,
            &[node_id],
            &outputs,
            &attempts,
            &HashMap::new(),
            None,
            Utc::now(),
            Some(Utc::now()),
            Utc::now(),
        );

        assert_eq!(archive.nodes.len(), 1);
        assert_eq!(archive.nodes[0].attempt_count, 2);
        assert!(archive.nodes[0].output.is_some());
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let repo = InMemoryArchiveRepository::new();
        let archive = make_archive(Utc::now());
        let id = archive.execution_id;
        repo.save(archive).await.unwrap();

        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.execution_id, id);
    }

    #[tokio::test]
    async fn find_older_than_filters_by_archived_at() {
        let repo = InMemoryArchiveRepository::new();
        repo.save(make_archive(Utc::now())).await.unwrap();

        let cutoff = Utc::now() + chrono::Duration::hours(1);
        let found = repo.find_older_than(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);

        let cutoff = Utc::now() - chrono::Duration::hours(1);
        assert!(repo.find_older_than(cutoff).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let repo = InMemoryArchiveRepository::new();
        let archive = make_archive(Utc::now());
        let id = archive.execution_id;
        repo.save(archive).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_none());
    }
}
