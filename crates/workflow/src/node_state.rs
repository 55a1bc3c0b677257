//! Per-node execution state as tracked by the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of one node within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Waiting on upstream dependencies.
    Pending,
    /// All dependencies satisfied; eligible for dispatch.
    Ready,
    /// Dispatched to a worker, in flight.
    Running,
    /// Suspended pending an external event (webhook, timer, approval, form,
    /// or a nested execution) before it can resume.
    Waiting,
    /// Finished successfully; output recorded.
    Completed,
    /// Finished with an error.
    Failed,
    /// Failed and scheduled for an automatic retry.
    Retrying,
    /// Execution was cancelled before this node finished.
    Cancelled,
    /// A branching ancestor did not select the handle leading to this node.
    Skipped,
}

impl NodeState {
    /// Returns `true` if this state will never change again within the
    /// current execution attempt.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Skipped
        )
    }

    /// Returns `true` if this node is currently doing or awaiting work
    /// within the execution (dispatched, retrying, or suspended).
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Retrying | Self::Waiting)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}
