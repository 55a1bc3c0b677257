//! Execution state tracking for workflows and individual nodes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nebula_core::{ExecutionId, NodeId, WorkflowId};
use nebula_workflow::NodeState;
use serde::{Deserialize, Serialize};

use crate::attempt::NodeAttempt;
use crate::error::ExecutionError;
use crate::output::NodeOutput;
use crate::status::ExecutionStatus;
use crate::transition::{validate_execution_transition, validate_node_transition};

/// The execution state of a single node within a running workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecutionState {
    /// Current state of the node.
    pub state: NodeState,
    /// All attempts made to execute this node.
    pub attempts: Vec<NodeAttempt>,
    /// The current output, if any.
    #[serde(default)]
    pub current_output: Option<NodeOutput>,
    /// When this node was first scheduled.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When this node started its first attempt.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When this node reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message if the node failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl NodeExecutionState {
    /// Create a new node execution state in the Pending state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: NodeState::Pending,
            attempts: Vec::new(),
            current_output: None,
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// Number of attempts made so far.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Get the latest attempt, if any.
    #[must_use]
    pub fn latest_attempt(&self) -> Option<&NodeAttempt> {
        self.attempts.last()
    }

    /// Transition to a new state, validating the transition.
    pub fn transition_to(&mut self, new_state: NodeState) -> Result<(), ExecutionError> {
        validate_node_transition(self.state, new_state)?;
        self.state = new_state;

        if new_state == NodeState::Ready {
            self.scheduled_at = Some(Utc::now());
        }
        if new_state == NodeState::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if new_state.is_terminal() {
            self.completed_at = Some(Utc::now());
        }

        Ok(())
    }
}

impl Default for NodeExecutionState {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete execution state of a running workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Unique identifier for this execution.
    pub execution_id: ExecutionId,
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// Current execution status.
    pub status: ExecutionStatus,
    /// Per-node execution states.
    pub node_states: HashMap<NodeId, NodeExecutionState>,
    /// Optimistic concurrency version (bumped on each state change).
    pub version: u64,
    /// When the execution was created.
    pub created_at: DateTime<Utc>,
    /// When the execution was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the execution started running.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution completed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Total retry attempts across all nodes.
    pub total_retries: u32,
    /// Total output bytes across all nodes.
    pub total_output_bytes: u64,
    /// Execution-level variables.
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Outbound handles selected by each branching node that has run.
    #[serde(default)]
    pub branch_decisions: HashMap<NodeId, Vec<String>>,
    /// The node currently suspending the execution, while `status` is
    /// `Waiting`.
    #[serde(default)]
    pub waiting_node_id: Option<NodeId>,
    /// Why the execution is paused, if `status` is `Paused`.
    #[serde(default)]
    pub pause_reason: Option<String>,
    /// Why the execution was cancelled, if `status` is `Cancelled`.
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// The execution this one was retried from, if any.
    #[serde(default)]
    pub retry_of: Option<ExecutionId>,
    /// How many times this execution lineage has been retried.
    #[serde(default)]
    pub retry_count: u32,
    /// Maximum number of retries allowed for this lineage.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Default retry ceiling for a fresh execution.
fn default_max_retries() -> u32 {
    3
}

impl ExecutionState {
    /// Create a new execution state.
    #[must_use]
    pub fn new(execution_id: ExecutionId, workflow_id: WorkflowId, node_ids: &[NodeId]) -> Self {
        let now = Utc::now();
        let mut node_states = HashMap::new();
        for &nid in node_ids {
            node_states.insert(nid, NodeExecutionState::new());
        }

        Self {
            execution_id,
            workflow_id,
            status: ExecutionStatus::Created,
            node_states,
            version: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            total_retries: 0,
            total_output_bytes: 0,
            variables: serde_json::Map::new(),
            branch_decisions: HashMap::new(),
            waiting_node_id: None,
            pause_reason: None,
            cancel_reason: None,
            retry_of: None,
            retry_count: 0,
            max_retries: default_max_retries(),
        }
    }

    /// Get a node's execution state.
    #[must_use]
    pub fn node_state(&self, node_id: NodeId) -> Option<&NodeExecutionState> {
        self.node_states.get(&node_id)
    }

    /// Set a node's execution state.
    pub fn set_node_state(&mut self, node_id: NodeId, state: NodeExecutionState) {
        self.node_states.insert(node_id, state);
    }

    /// Returns `true` if all nodes are in terminal states.
    #[must_use]
    pub fn all_nodes_terminal(&self) -> bool {
        self.node_states.values().all(|ns| ns.state.is_terminal())
    }

    /// Get the IDs of all currently active (running/retrying) nodes.
    #[must_use]
    pub fn active_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state.is_active())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Get the IDs of all completed nodes.
    #[must_use]
    pub fn completed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Completed)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Get the IDs of all failed nodes.
    #[must_use]
    pub fn failed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Failed)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Transition the execution status, validating the transition and bumping the version.
    pub fn transition_status(&mut self, new_status: ExecutionStatus) -> Result<(), ExecutionError> {
        validate_execution_transition(self.status, new_status)?;
        self.status = new_status;
        self.version += 1;
        self.updated_at = Utc::now();

        if new_status == ExecutionStatus::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if new_status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        if new_status != ExecutionStatus::Waiting {
            self.waiting_node_id = None;
        }
        if new_status != ExecutionStatus::Paused {
            self.pause_reason = None;
        }

        Ok(())
    }

    /// Mark the execution as suspended on `node_id`, recording the node
    /// that caused the suspension alongside the status transition.
    pub fn transition_to_waiting(&mut self, node_id: NodeId) -> Result<(), ExecutionError> {
        self.transition_status(ExecutionStatus::Waiting)?;
        self.waiting_node_id = Some(node_id);
        Ok(())
    }

    /// Pause the execution, recording why.
    pub fn transition_to_paused(&mut self, reason: impl Into<String>) -> Result<(), ExecutionError> {
        self.transition_status(ExecutionStatus::Paused)?;
        self.pause_reason = Some(reason.into());
        Ok(())
    }

    /// Cancel the execution, recording why.
    pub fn transition_to_cancelled(&mut self, reason: impl Into<String>) -> Result<(), ExecutionError> {
        self.transition_status(ExecutionStatus::Cancelled)?;
        self.cancel_reason = Some(reason.into());
        Ok(())
    }

    /// Build a fresh execution state that retries this one.
    ///
    /// Only terminal non-success executions (`Failed`, `Cancelled`,
    /// `TimedOut`) can be retried — a `Completed` execution has nothing to
    /// retry. The new state gets a new id, starts at `Created` with the
    /// same node set and a copy of the original's variables (the trigger
    /// input), and carries `retry_of`/`retry_count` forward so the lineage
    /// can be traced back to its origin.
    pub fn retry(&self, new_execution_id: ExecutionId) -> Result<Self, ExecutionError> {
        if !matches!(
            self.status,
            ExecutionStatus::Failed | ExecutionStatus::Cancelled | ExecutionStatus::TimedOut
        ) {
            return Err(ExecutionError::NotRetryable {
                status: self.status,
            });
        }
        if self.retry_count >= self.max_retries {
            return Err(ExecutionError::RetryLimitExceeded {
                retry_count: self.retry_count,
                max_retries: self.max_retries,
            });
        }

        let node_ids: Vec<NodeId> = self.node_states.keys().copied().collect();
        let mut retried = Self::new(new_execution_id, self.workflow_id, &node_ids);
        retried.variables = self.variables.clone();
        retried.retry_of = Some(self.execution_id);
        retried.retry_count = self.retry_count + 1;
        retried.max_retries = self.max_retries;
        Ok(retried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state() -> (ExecutionState, NodeId, NodeId) {
        let n1 = NodeId::v4();
        let n2 = NodeId::v4();
        let state = ExecutionState::new(ExecutionId::v4(), WorkflowId::v4(), &[n1, n2]);
        (state, n1, n2)
    }

    #[test]
    fn new_execution_state() {
        let (state, n1, _n2) = make_state();
        assert_eq!(state.status, ExecutionStatus::Created);
        assert_eq!(state.version, 0);
        assert_eq!(state.node_states.len(), 2);
        assert_eq!(state.node_state(n1).unwrap().state, NodeState::Pending);
    }

    #[test]
    fn node_execution_state_default() {
        let nes = NodeExecutionState::new();
        assert_eq!(nes.state, NodeState::Pending);
        assert_eq!(nes.attempt_count(), 0);
        assert!(nes.latest_attempt().is_none());
        assert!(nes.scheduled_at.is_none());
    }

    #[test]
    fn node_state_transition() {
        let mut nes = NodeExecutionState::new();
        assert!(nes.transition_to(NodeState::Ready).is_ok());
        assert_eq!(nes.state, NodeState::Ready);
        assert!(nes.scheduled_at.is_some());

        assert!(nes.transition_to(NodeState::Running).is_ok());
        assert_eq!(nes.state, NodeState::Running);
        assert!(nes.started_at.is_some());

        assert!(nes.transition_to(NodeState::Completed).is_ok());
        assert!(nes.completed_at.is_some());
    }

    #[test]
    fn node_state_invalid_transition() {
        let mut nes = NodeExecutionState::new();
        let err = nes.transition_to(NodeState::Completed).unwrap_err();
        assert!(err.to_string().contains("invalid transition"));
    }

    #[test]
    fn all_nodes_terminal() {
        let (mut state, n1, n2) = make_state();
        assert!(!state.all_nodes_terminal());

        state.node_states.get_mut(&n1).unwrap().state = NodeState::Completed;
        state.node_states.get_mut(&n2).unwrap().state = NodeState::Failed;
        assert!(state.all_nodes_terminal());
    }

    #[test]
    fn active_node_ids() {
        let (mut state, n1, _n2) = make_state();
        state.node_states.get_mut(&n1).unwrap().state = NodeState::Running;
        let active = state.active_node_ids();
        assert_eq!(active.len(), 1);
        assert!(active.contains(&n1));
    }

    #[test]
    fn completed_and_failed_node_ids() {
        let (mut state, n1, n2) = make_state();
        state.node_states.get_mut(&n1).unwrap().state = NodeState::Completed;
        state.node_states.get_mut(&n2).unwrap().state = NodeState::Failed;

        assert_eq!(state.completed_node_ids(), vec![n1]);
        assert_eq!(state.failed_node_ids(), vec![n2]);
    }

    #[test]
    fn transition_status_valid() {
        let (mut state, _n1, _n2) = make_state();
        assert!(state.transition_status(ExecutionStatus::Running).is_ok());
        assert_eq!(state.status, ExecutionStatus::Running);
        assert_eq!(state.version, 1);
        assert!(state.started_at.is_some());
    }

    #[test]
    fn transition_status_invalid() {
        let (mut state, _n1, _n2) = make_state();
        let err = state
            .transition_status(ExecutionStatus::Completed)
            .unwrap_err();
        assert!(err.to_string().contains("invalid transition"));
        assert_eq!(state.version, 0); // version not bumped
    }

    #[test]
    fn transition_status_terminal_sets_completed_at() {
        let (mut state, _n1, _n2) = make_state();
        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_status(ExecutionStatus::Completed).unwrap();
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn set_node_state() {
        let (mut state, _n1, _n2) = make_state();
        let new_node = NodeId::v4();
        state.set_node_state(new_node, NodeExecutionState::new());
        assert!(state.node_state(new_node).is_some());
    }

    #[test]
    fn transition_to_waiting_records_node() {
        let (mut state, n1, _n2) = make_state();
        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_to_waiting(n1).unwrap();
        assert_eq!(state.status, ExecutionStatus::Waiting);
        assert_eq!(state.waiting_node_id, Some(n1));

        state.transition_status(ExecutionStatus::Running).unwrap();
        assert!(state.waiting_node_id.is_none());
    }

    #[test]
    fn transition_to_paused_records_reason() {
        let (mut state, _n1, _n2) = make_state();
        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_to_paused("user requested").unwrap();
        assert_eq!(state.status, ExecutionStatus::Paused);
        assert_eq!(state.pause_reason.as_deref(), Some("user requested"));
    }

    #[test]
    fn transition_to_cancelled_records_reason() {
        let (mut state, _n1, _n2) = make_state();
        state.transition_status(ExecutionStatus::Running).unwrap();
        state
            .transition_status(ExecutionStatus::Cancelling)
            .unwrap();
        state.transition_to_cancelled("operator request").unwrap();
        assert_eq!(state.status, ExecutionStatus::Cancelled);
        assert_eq!(state.cancel_reason.as_deref(), Some("operator request"));
    }

    #[test]
    fn branch_decisions_default_empty() {
        let (state, _n1, _n2) = make_state();
        assert!(state.branch_decisions.is_empty());
    }

    #[test]
    fn retry_rejects_non_terminal_or_success_status() {
        let (mut state, _n1, _n2) = make_state();
        assert!(matches!(
            state.retry(ExecutionId::v4()).unwrap_err(),
            ExecutionError::NotRetryable { .. }
        ));

        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_status(ExecutionStatus::Completed).unwrap();
        assert!(matches!(
            state.retry(ExecutionId::v4()).unwrap_err(),
            ExecutionError::NotRetryable { .. }
        ));
    }

    #[test]
    fn retry_builds_fresh_state_with_lineage() {
        let (mut state, n1, n2) = make_state();
        state.variables.insert("x".into(), serde_json::json!(1));
        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_status(ExecutionStatus::Failed).unwrap();

        let new_id = ExecutionId::v4();
        let retried = state.retry(new_id).unwrap();
        assert_eq!(retried.execution_id, new_id);
        assert_eq!(retried.status, ExecutionStatus::Created);
        assert_eq!(retried.retry_of, Some(state.execution_id));
        assert_eq!(retried.retry_count, 1);
        assert_eq!(retried.variables.get("x"), Some(&serde_json::json!(1)));
        assert!(retried.node_state(n1).is_some());
        assert!(retried.node_state(n2).is_some());
    }

    #[test]
    fn retry_limit_exceeded() {
        let (mut state, _n1, _n2) = make_state();
        state.max_retries = 1;
        state.retry_count = 1;
        state.transition_status(ExecutionStatus::Running).unwrap();
        state.transition_status(ExecutionStatus::Failed).unwrap();

        assert!(matches!(
            state.retry(ExecutionId::v4()).unwrap_err(),
            ExecutionError::RetryLimitExceeded { .. }
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let (state, _n1, _n2) = make_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: ExecutionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.execution_id, state.execution_id);
        assert_eq!(back.workflow_id, state.workflow_id);
        assert_eq!(back.status, state.status);
        assert_eq!(back.node_states.len(), state.node_states.len());
    }
}
