//! Periodic archival: denormalize terminal executions, then purge archives
//! past their retention window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nebula_core::WorkflowId;
use nebula_execution::StateManager;
use nebula_persistence::{build_archive, ArchiveRepository, ExecutionRepository};

use crate::error::ArchiveError;

/// How often the sweep runs, absent other configuration.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Minimum age a terminal execution must reach before it is archived.
pub const DEFAULT_MIN_AGE: chrono::Duration = chrono::Duration::minutes(15);

/// Executions archived per sweep pass.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// How long an archive is kept before the retention purge removes it.
pub const DEFAULT_RETENTION: chrono::Duration = chrono::Duration::days(30);

/// Resolves the workflow name/version to denormalize into an archive record.
///
/// There is no workflow-definition repository in this workspace — a flow may
/// have been edited or deleted by the time its execution is archived — so
/// callers that keep flow definitions around (an `apps/cli` composition root,
/// say) implement this against whatever registry they hold. A lookup miss
/// falls back to the workflow id itself.
pub trait WorkflowLookup: Send + Sync {
    /// Look up the name and version a workflow had when it last ran.
    fn workflow_name_version(&self, workflow_id: WorkflowId) -> Option<(String, u32)>;
}

/// A [`WorkflowLookup`] that never resolves anything, for callers that don't
/// track flow metadata outside the execution itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWorkflowLookup;

impl WorkflowLookup for NoWorkflowLookup {
    fn workflow_name_version(&self, _workflow_id: WorkflowId) -> Option<(String, u32)> {
        None
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Executions successfully archived and removed from the live repository.
    pub archived: usize,
    /// Executions whose archival failed; they remain in the live repository
    /// and are retried on the next pass.
    pub failed: usize,
    /// Archive records removed by the retention purge.
    pub purged: usize,
}

/// Denormalizes terminal executions into [`nebula_persistence::ExecutionArchive`]
/// records and enforces the retention window.
///
/// Mirrors [`nebula_approval::ApprovalCoordinator`]'s expiration sweep: a
/// periodic pass driven by `tokio::time::interval`, with per-record failures
/// logged and skipped rather than aborting the whole batch.
pub struct ArchiveService {
    executions: Arc<dyn ExecutionRepository>,
    archives: Arc<dyn ArchiveRepository>,
    workflows: Arc<dyn WorkflowLookup>,
    state_manager: Option<StateManager>,
}

impl ArchiveService {
    /// Build a service over the given repositories.
    #[must_use]
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        archives: Arc<dyn ArchiveRepository>,
        workflows: Arc<dyn WorkflowLookup>,
    ) -> Self {
        Self {
            executions,
            archives,
            workflows,
            state_manager: None,
        }
    }

    /// Also evict each archived execution from the engine's live
    /// [`StateManager`] registry once its archive is durably saved.
    #[must_use]
    pub fn with_state_manager(mut self, state_manager: StateManager) -> Self {
        self.state_manager = Some(state_manager);
        self
    }

    /// Archive every terminal execution older than `min_age`, up to
    /// `batch_size` records, then purge archives older than `retention`.
    pub async fn sweep_once(
        &self,
        min_age: chrono::Duration,
        batch_size: usize,
        retention: chrono::Duration,
    ) -> Result<SweepReport, ArchiveError> {
        let mut report = SweepReport::default();

        let cutoff = Utc::now() - min_age;
        let candidates = self.executions.find_completed_before(cutoff).await?;

        for state in candidates.into_iter().take(batch_size) {
            let execution_id = state.execution_id;

            let node_ids: Vec<_> = state.node_states.keys().copied().collect();
            let node_outputs: HashMap<_, _> = state
                .node_states
                .iter()
                .filter_map(|(&id, ns)| ns.current_output.clone().map(|out| (id, out)))
                .collect();
            let attempt_counts: HashMap<_, _> = state
                .node_states
                .iter()
                .map(|(&id, ns)| (id, ns.attempt_count()))
                .collect();
            let error_messages: HashMap<_, _> = state
                .node_states
                .iter()
                .filter_map(|(&id, ns)| ns.error_message.clone().map(|msg| (id, msg)))
                .collect();

            let (workflow_name, workflow_version) = self
                .workflows
                .workflow_name_version(state.workflow_id)
                .unwrap_or_else(|| (state.workflow_id.to_string(), 0));

            let archive = build_archive(
                execution_id,
                state.workflow_id,
                workflow_name,
                workflow_version,
                state.status,
                &node_ids,
                &node_outputs,
                &attempt_counts,
                &error_messages,
                None,
                state.created_at,
                state.started_at,
                state.completed_at.unwrap_or_else(Utc::now),
            );

            if let Err(err) = self.archives.save(archive).await {
                tracing::warn!(%execution_id, "failed to save archive, will retry next sweep: {err}");
                report.failed += 1;
                continue;
            }

            if let Err(err) = self.executions.delete(execution_id).await {
                tracing::warn!(%execution_id, "archived execution but failed to delete live record: {err}");
            }

            if let Some(state_manager) = &self.state_manager {
                state_manager.cleanup_execution(execution_id);
            }

            report.archived += 1;
        }

        report.purged = self.purge_expired(retention).await?;
        Ok(report)
    }

    /// Delete archive records older than `retention`. Run as part of
    /// [`Self::sweep_once`], but exposed separately for ad hoc invocation.
    pub async fn purge_expired(&self, retention: chrono::Duration) -> Result<usize, ArchiveError> {
        let cutoff = Utc::now() - retention;
        let expired = self.archives.find_older_than(cutoff).await?;
        let mut purged = 0;

        for archive in expired {
            if let Err(err) = self.archives.delete(archive.execution_id).await {
                tracing::warn!(
                    execution_id = %archive.execution_id,
                    "failed to purge expired archive: {err}"
                );
                continue;
            }
            purged += 1;
        }

        Ok(purged)
    }

    /// Spawn the periodic sweep loop. Cancellation is via `shutdown`, checked
    /// at the top of each iteration.
    pub fn spawn_sweep(
        self: &Arc<Self>,
        interval: Duration,
        min_age: chrono::Duration,
        batch_size: usize,
        retention: chrono::Duration,
        shutdown: Arc<tokio::sync::RwLock<bool>>,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                if *shutdown.read().await {
                    break;
                }

                match service.sweep_once(min_age, batch_size, retention).await {
                    Ok(report) if report.archived > 0 || report.purged > 0 => {
                        tracing::info!(
                            archived = report.archived,
                            failed = report.failed,
                            purged = report.purged,
                            "archival sweep completed"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!("archival sweep failed: {err}"),
                }

                tokio::time::sleep(interval).await;
            }
        })
    }
}
