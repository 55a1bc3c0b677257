//! Cross-execution state registry.
//!
//! [`ExecutionState`] models the scratch memory for a single execution;
//! [`StateManager`] is the shared, thread-safe registry of those states keyed
//! by [`ExecutionId`] that the scheduler and workers hold a handle to across
//! the whole process. State must survive a suspension (approval/form/wait) —
//! nothing here is tied to the worker that produced it.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_core::{ExecutionId, NodeId};
use parking_lot::RwLock;

use crate::error::ExecutionError;
use crate::output::NodeOutput;
use crate::state::ExecutionState;
use crate::status::ExecutionStatus;

/// Shared registry of [`ExecutionState`] for every in-flight execution.
///
/// Cheap to clone (`Arc` internally) — workers and the scheduler each hold
/// their own handle. A write to one node's output is visible to any reader
/// that acquires the lock afterwards.
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    executions: Arc<RwLock<HashMap<ExecutionId, ExecutionState>>>,
}

impl StateManager {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an execution entry. Idempotent: a repeat call with the same
    /// `execution_id` leaves the existing entry untouched.
    pub fn init_execution(&self, initial: ExecutionState) {
        let mut executions = self.executions.write();
        executions.entry(initial.execution_id).or_insert(initial);
    }

    /// Record a node's output, creating the node's state if absent.
    ///
    /// Atomic with respect to other callers: a subsequent `get_node_output`
    /// on any handle to this registry observes the write.
    pub fn record_node_output(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        output: NodeOutput,
    ) -> Result<(), ExecutionError> {
        let mut executions = self.executions.write();
        let state = executions
            .get_mut(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        state
            .node_states
            .entry(node_id)
            .or_default()
            .current_output = Some(output);
        state.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Get a node's current output, if any has been recorded.
    #[must_use]
    pub fn get_node_output(&self, execution_id: ExecutionId, node_id: NodeId) -> Option<NodeOutput> {
        let executions = self.executions.read();
        executions
            .get(&execution_id)?
            .node_state(node_id)?
            .current_output
            .clone()
    }

    /// Record which outbound handles a branching node selected.
    pub fn record_branch_decision(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        branches: Vec<String>,
    ) -> Result<(), ExecutionError> {
        let mut executions = self.executions.write();
        let state = executions
            .get_mut(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        state
            .branch_decisions
            .insert(node_id, branches);
        state.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Read back the branches a node selected, if it has run and branched.
    #[must_use]
    pub fn get_branch_decision(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Option<Vec<String>> {
        let executions = self.executions.read();
        executions
            .get(&execution_id)?
            .branch_decisions
            .get(&node_id)
            .cloned()
    }

    /// Update an execution's status, validating the transition.
    pub fn update_execution_status(
        &self,
        execution_id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<(), ExecutionError> {
        let mut executions = self.executions.write();
        let state = executions
            .get_mut(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        state.transition_status(status)
    }

    /// Suspend an execution on `node_id` (approval, form, or explicit wait).
    pub fn suspend_execution(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Result<(), ExecutionError> {
        let mut executions = self.executions.write();
        let state = executions
            .get_mut(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        state.transition_to_waiting(node_id)
    }

    /// Resume a suspended execution, clearing `waiting_node_id`.
    pub fn resume_execution(&self, execution_id: ExecutionId) -> Result<(), ExecutionError> {
        self.update_execution_status(execution_id, ExecutionStatus::Running)
    }

    /// Cancel an execution, recording the reason.
    pub fn cancel_execution(
        &self,
        execution_id: ExecutionId,
        reason: impl Into<String>,
    ) -> Result<(), ExecutionError> {
        let mut executions = self.executions.write();
        let state = executions
            .get_mut(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        state.transition_to_cancelled(reason)
    }

    /// Build and register a fresh execution that retries `execution_id`.
    ///
    /// Returns the new execution's state (already `init_execution`d). The
    /// original execution's record is left untouched, unlinked by status —
    /// callers that need it gone from the live registry call
    /// `cleanup_execution` themselves.
    pub fn retry_execution(
        &self,
        execution_id: ExecutionId,
        new_execution_id: ExecutionId,
    ) -> Result<ExecutionState, ExecutionError> {
        let mut executions = self.executions.write();
        let original = executions
            .get(&execution_id)
            .ok_or(ExecutionError::ExecutionNotFound { execution_id })?;
        let retried = original.retry(new_execution_id)?;
        executions.insert(new_execution_id, retried.clone());
        Ok(retried)
    }

    /// Snapshot of every node's output for an execution, keyed by node id.
    /// Used for trace/debug UIs — not on the execution hot path.
    #[must_use]
    pub fn get_execution_output(
        &self,
        execution_id: ExecutionId,
    ) -> Option<HashMap<NodeId, NodeOutput>> {
        let executions = self.executions.read();
        let state = executions.get(&execution_id)?;
        Some(
            state
                .node_states
                .iter()
                .filter_map(|(&id, ns)| ns.current_output.clone().map(|out| (id, out)))
                .collect(),
        )
    }

    /// Fetch a clone of the full execution state, if present.
    #[must_use]
    pub fn get_execution(&self, execution_id: ExecutionId) -> Option<ExecutionState> {
        self.executions.read().get(&execution_id).cloned()
    }

    /// Remove an execution's state. Called at archival. Idempotent.
    pub fn cleanup_execution(&self, execution_id: ExecutionId) {
        self.executions.write().remove(&execution_id);
    }

    /// Number of tracked executions. Mostly useful in tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executions.read().len()
    }

    /// Returns `true` if no executions are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executions.read().is_empty()
    }
}
