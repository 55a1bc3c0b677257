//! Execution error types.

use nebula_core::{ExecutionId, NodeId};
use thiserror::Error;

use crate::status::ExecutionStatus;

/// Errors that can occur during workflow execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A state transition is not valid for the current status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },

    /// An execution-status transition is not valid for the current status.
    #[error("invalid execution transition from {from} to {to}")]
    InvalidExecutionTransition {
        /// Current status.
        from: ExecutionStatus,
        /// Attempted target status.
        to: ExecutionStatus,
    },

    /// No tracked state exists for this execution id.
    #[error("execution not found: {execution_id}")]
    ExecutionNotFound {
        /// The missing execution id.
        execution_id: ExecutionId,
    },

    /// A referenced node does not exist in the execution state.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The execution plan failed validation.
    #[error("plan validation: {0}")]
    PlanValidation(String),

    /// A budget limit was exceeded.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    /// An idempotency key has already been used.
    #[error("duplicate idempotency key: {0}")]
    DuplicateIdempotencyKey(String),

    /// A serialization or deserialization error.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The execution was cancelled.
    #[error("execution cancelled")]
    Cancelled,

    /// Only terminal non-success executions can be retried.
    #[error("execution in status {status} cannot be retried")]
    NotRetryable {
        /// The execution's current status.
        status: ExecutionStatus,
    },

    /// The execution lineage has already been retried `max_retries` times.
    #[error("retry limit exceeded: {retry_count}/{max_retries}")]
    RetryLimitExceeded {
        /// How many retries have already been made.
        retry_count: u32,
        /// The configured ceiling.
        max_retries: u32,
    },
}

impl ExecutionError {
    /// Create an invalid-transition error from execution statuses.
    pub fn invalid_execution_transition(from: ExecutionStatus, to: ExecutionStatus) -> Self {
        Self::InvalidExecutionTransition { from, to }
    }
}
