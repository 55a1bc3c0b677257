//! File-backed repository implementations, one JSON snapshot per collection.
//!
//! The in-memory repositories are the reference implementation; a real
//! deployment backs these ports with Postgres, SQLite, or a KV store. For
//! `apps/cli`, invoked as a separate OS process per subcommand, "in-memory"
//! means state vanishes between `nebula-cli execution list` and the next
//! invocation. These wrappers close that gap the cheap way: hold the same
//! `DashMap`-backed state in memory for the process's lifetime, and persist
//! the whole collection to a single JSON file after every mutating call and
//! hydrate it back on construction. No partial writes, no migrations, no
//! concurrent-writer story beyond a single CLI process at a time — a
//! deliberately small scope for a deliberately small deployment target.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_core::{ApprovalId, ExecutionId, FormSubmissionId, FormTriggerId, NodeId, WorkflowId};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::approval::{Approval, ApprovalRepository, ApprovalStatus};
use crate::archive::{ArchiveRepository, ExecutionArchive};
use crate::error::PersistenceError;
use crate::execution::ExecutionRepository;
use crate::form::{FormSubmission, FormTrigger, FormTriggerRepository};
use nebula_execution::ExecutionState;

fn load<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    std::fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn store<T: Serialize>(path: &Path, records: &[T]) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(records).map_err(|e| PersistenceError::Backend(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Backend(e.to_string()))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| PersistenceError::Backend(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| PersistenceError::Backend(e.to_string()))?;
    Ok(())
}

/// File-backed [`ExecutionRepository`], snapshotted to `<dir>/executions.json`.
#[derive(Debug)]
pub struct FileExecutionRepository {
    path: PathBuf,
    executions: DashMap<ExecutionId, ExecutionState>,
    lock: Mutex<()>,
}

impl FileExecutionRepository {
    /// Open (creating if absent) the execution snapshot under `dir`.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("executions.json");
        let loaded: Vec<ExecutionState> = load(&path);
        let executions = DashMap::new();
        for state in loaded {
            executions.insert(state.execution_id, state);
        }
        Self { path, executions, lock: Mutex::new(()) }
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let snapshot: Vec<ExecutionState> = self.executions.iter().map(|e| e.clone()).collect();
        store(&self.path, &snapshot)
    }
}

#[async_trait]
impl ExecutionRepository for FileExecutionRepository {
    async fn save(&self, state: ExecutionState) -> Result<(), PersistenceError> {
        self.executions.insert(state.execution_id, state);
        self.flush()
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
        self.flush()
    }
}

/// File-backed [`ApprovalRepository`], snapshotted to `<dir>/approvals.json`.
#[derive(Debug)]
pub struct FileApprovalRepository {
    path: PathBuf,
    approvals: DashMap<ApprovalId, Approval>,
    lock: Mutex<()>,
}

impl FileApprovalRepository {
    /// Open (creating if absent) the approval snapshot under `dir`.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("approvals.json");
        let loaded: Vec<Approval> = load(&path);
        let approvals = DashMap::new();
        for approval in loaded {
            approvals.insert(approval.approval_id, approval);
        }
        Self { path, approvals, lock: Mutex::new(()) }
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let snapshot: Vec<Approval> = self.approvals.iter().map(|a| a.clone()).collect();
        store(&self.path, &snapshot)
    }

    /// All stored approvals, newest first. Used by the CLI's `approval list`.
    #[must_use]
    pub fn all(&self) -> Vec<Approval> {
        let mut all: Vec<Approval> = self.approvals.iter().map(|a| a.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}

#[async_trait]
impl ApprovalRepository for FileApprovalRepository {
    async fn save(&self, approval: Approval) -> Result<(), PersistenceError> {
        self.approvals.insert(approval.approval_id, approval);
        self.flush()
    }

    async fn get(&self, approval_id: ApprovalId) -> Result<Option<Approval>, PersistenceError> {
        Ok(self.approvals.get(&approval_id).map(|a| a.clone()))
    }

    async fn find_pending_expired(&self, now: DateTime<Utc>) -> Result<Vec<Approval>, PersistenceError> {
        Ok(self
            .approvals
            .iter()
            .filter(|a| a.status == ApprovalStatus::Pending && a.expires_at.is_some_and(|exp| exp < now))
            .map(|a| a.clone())
            .collect())
    }

    async fn delete(&self, approval_id: ApprovalId) -> Result<(), PersistenceError> {
        self.approvals.remove(&approval_id);
        self.flush()
    }
}

/// File-backed [`FormTriggerRepository`], snapshotted to
/// `<dir>/form_triggers.json` and `<dir>/form_submissions.json`.
#[derive(Debug)]
pub struct FileFormTriggerRepository {
    triggers_path: PathBuf,
    submissions_path: PathBuf,
    triggers: DashMap<FormTriggerId, FormTrigger>,
    submissions: DashMap<FormSubmissionId, FormSubmission>,
    lock: Mutex<()>,
}

impl FileFormTriggerRepository {
    /// Open (creating if absent) the form trigger/submission snapshots under `dir`.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let triggers_path = dir.join("form_triggers.json");
        let submissions_path = dir.join("form_submissions.json");

        let triggers = DashMap::new();
        for trigger in load::<FormTrigger>(&triggers_path) {
            triggers.insert(trigger.trigger_id, trigger);
        }
        let submissions = DashMap::new();
        for submission in load::<FormSubmission>(&submissions_path) {
            submissions.insert(submission.submission_id, submission);
        }

        Self { triggers_path, submissions_path, triggers, submissions, lock: Mutex::new(()) }
    }

    fn flush_triggers(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let snapshot: Vec<FormTrigger> = self.triggers.iter().map(|t| t.clone()).collect();
        store(&self.triggers_path, &snapshot)
    }

    fn flush_submissions(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let snapshot: Vec<FormSubmission> = self.submissions.iter().map(|s| s.clone()).collect();
        store(&self.submissions_path, &snapshot)
    }

    /// All stored triggers. Used by the CLI's `form list`.
    #[must_use]
    pub fn all(&self) -> Vec<FormTrigger> {
        self.triggers.iter().map(|t| t.clone()).collect()
    }
}

#[async_trait]
impl FormTriggerRepository for FileFormTriggerRepository {
    async fn save(&self, trigger: FormTrigger) -> Result<(), PersistenceError> {
        self.triggers.insert(trigger.trigger_id, trigger);
        self.flush_triggers()
    }

    async fn get_by_id(&self, trigger_id: FormTriggerId) -> Result<Option<FormTrigger>, PersistenceError> {
        Ok(self.triggers.get(&trigger_id).map(|t| t.clone()))
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<FormTrigger>, PersistenceError> {
        Ok(self.triggers.iter().find(|t| t.token == token).map(|t| t.clone()))
    }

    async fn get_by_flow_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
    ) -> Result<Option<FormTrigger>, PersistenceError> {
        Ok(self
            .triggers
            .iter()
            .find(|t| t.workflow_id == workflow_id && t.node_id == node_id)
            .map(|t| t.clone()))
    }

    async fn delete(&self, trigger_id: FormTriggerId) -> Result<(), PersistenceError> {
        self.triggers.remove(&trigger_id);
        self.flush_triggers()
    }

    async fn save_submission(&self, submission: FormSubmission) -> Result<(), PersistenceError> {
        self.submissions.insert(submission.submission_id, submission);
        self.flush_submissions()
    }

    async fn submissions_for(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Result<Vec<FormSubmission>, PersistenceError> {
        Ok(self
            .submissions
            .iter()
            .filter(|s| s.execution_id == execution_id && s.node_id == node_id)
            .map(|s| s.clone())
            .collect())
    }
}

/// File-backed [`ArchiveRepository`], snapshotted to `<dir>/archives.json`.
#[derive(Debug)]
pub struct FileArchiveRepository {
    path: PathBuf,
    archives: DashMap<ExecutionId, ExecutionArchive>,
    lock: Mutex<()>,
}

impl FileArchiveRepository {
    /// Open (creating if absent) the archive snapshot under `dir`.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("archives.json");
        let loaded: Vec<ExecutionArchive> = load(&path);
        let archives = DashMap::new();
        for archive in loaded {
            archives.insert(archive.execution_id, archive);
        }
        Self { path, archives, lock: Mutex::new(()) }
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let snapshot: Vec<ExecutionArchive> = self.archives.iter().map(|a| a.clone()).collect();
        store(&self.path, &snapshot)
    }

    /// All stored archives, most recently archived first. Used by the
    /// CLI's `archive list`.
    #[must_use]
    pub fn all(&self) -> Vec<ExecutionArchive> {
        let mut all: Vec<ExecutionArchive> = self.archives.iter().map(|a| a.clone()).collect();
        all.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        all
    }
}

#[async_trait]
impl ArchiveRepository for FileArchiveRepository {
    async fn save(&self, archive: ExecutionArchive) -> Result<(), PersistenceError> {
        self.archives.insert(archive.execution_id, archive);
        self.flush()
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
        self.flush()
    }
}
