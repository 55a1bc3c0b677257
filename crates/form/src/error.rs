//! Form coordination errors.

use nebula_core::{FormTriggerId, NodeId, WorkflowId};
use nebula_persistence::PersistenceError;
use thiserror::Error;

/// Errors raised by [`crate::FormCoordinator`].
#[derive(Debug, Error)]
pub enum FormError {
    /// No trigger exists for the given id.
    #[error("form trigger {trigger_id} not found")]
    NotFound {
        /// The trigger that was looked up.
        trigger_id: FormTriggerId,
    },
    /// No trigger is configured for the given `(workflow_id, node_id)` pair.
    #[error("no form trigger configured for node {node_id} of workflow {workflow_id}")]
    NoTriggerForNode {
        /// The workflow that was looked up.
        workflow_id: WorkflowId,
        /// The node that was looked up.
        node_id: NodeId,
    },
    /// No trigger is configured for the given token.
    #[error("no form trigger for the given token")]
    UnknownToken,
    /// The trigger is not accepting submissions (inactive, expired, or at
    /// its submission cap).
    #[error("form trigger {trigger_id} is not accepting submissions")]
    NotAccepting {
        /// The trigger that rejected the submission.
        trigger_id: FormTriggerId,
    },
    /// A submission was already recorded for this `(execution_id, node_id)`
    /// pair.
    #[error("a submission was already recorded for this execution and node")]
    AlreadySubmitted,
    /// The underlying repository failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}
