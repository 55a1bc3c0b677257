//! Approval coordination errors.

use nebula_core::ApprovalId;
use nebula_persistence::PersistenceError;
use thiserror::Error;

/// Errors raised by [`crate::ApprovalCoordinator`].
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No approval exists with the given id.
    #[error("approval {approval_id} not found")]
    NotFound {
        /// The approval that was looked up.
        approval_id: ApprovalId,
    },
    /// The approval is no longer pending.
    #[error("approval {approval_id} is already resolved")]
    NotPending {
        /// The approval acted upon.
        approval_id: ApprovalId,
    },
    /// The approval's `expires_at` has passed.
    #[error("approval {approval_id} has expired")]
    Expired {
        /// The approval acted upon.
        approval_id: ApprovalId,
    },
    /// This user already recorded an action on this approval.
    #[error("user {user_id} already acted on approval {approval_id}")]
    AlreadyActed {
        /// The approval acted upon.
        approval_id: ApprovalId,
        /// The user who already acted.
        user_id: String,
    },
    /// The underlying repository failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}
