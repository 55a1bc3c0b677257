//! Approval gate coordination: creation, submission, resolution, and the
//! expiration sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nebula_core::{ApprovalId, ExecutionId, NodeId};
use nebula_persistence::{
    Approval, ApprovalDecision, ApprovalMode, ApprovalRepository, ApprovalStatus,
};
use nebula_telemetry::event::{EventBus, ExecutionEvent};

use crate::error::ApprovalError;

/// Default expiration sweep cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Coordinates multi-user approval gates: resolution rules, the expiration
/// sweep, and `approval-*` event emission the scheduler observes to
/// un-suspend an execution.
pub struct ApprovalCoordinator {
    repository: Arc<dyn ApprovalRepository>,
    events: Arc<EventBus>,
}

impl ApprovalCoordinator {
    /// Build a coordinator over the given repository and event bus.
    #[must_use]
    pub fn new(repository: Arc<dyn ApprovalRepository>, events: Arc<EventBus>) -> Self {
        Self { repository, events }
    }

    /// Create a new pending approval gate, emitting `APPROVAL_CREATED`.
    pub async fn create_approval(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        mode: ApprovalMode,
        required_approvers: u32,
        message: impl Into<String>,
        expires_in: Option<Duration>,
    ) -> Result<Approval, ApprovalError> {
        let expires_at = expires_in.map(|d| Utc::now() + chrono::Duration::from_std(d).unwrap_or_default());
        let approval = Approval::new(execution_id, node_id, mode, required_approvers, message, expires_at);
        self.repository.save(approval.clone()).await?;

        self.events.emit(ExecutionEvent::ApprovalCreated {
            approval_id: approval.approval_id.to_string(),
            execution_id: execution_id.to_string(),
        });

        Ok(approval)
    }

    /// Fetch an approval by id.
    pub async fn get_approval(&self, approval_id: ApprovalId) -> Result<Approval, ApprovalError> {
        self.repository
            .get(approval_id)
            .await?
            .ok_or(ApprovalError::NotFound { approval_id })
    }

    /// Cancel a pending approval (e.g. because its owning execution was
    /// cancelled).
    pub async fn cancel_approval(&self, approval_id: ApprovalId) -> Result<Approval, ApprovalError> {
        let mut approval = self.get_approval(approval_id).await?;
        if approval.status != ApprovalStatus::Pending {
            return Err(ApprovalError::NotPending { approval_id });
        }
        approval.resolve(ApprovalStatus::Cancelled);
        self.repository.save(approval.clone()).await?;
        self.emit_resolved(&approval);
        Ok(approval)
    }

    /// Record a user's approve/reject decision and resolve the approval if
    /// the mode's quorum is now met.
    pub async fn submit_approval(
        &self,
        approval_id: ApprovalId,
        user_id: impl Into<String>,
        decision: ApprovalDecision,
        comment: Option<String>,
    ) -> Result<Approval, ApprovalError> {
        let user_id = user_id.into();
        let mut approval = self.get_approval(approval_id).await?;

        if approval.status != ApprovalStatus::Pending {
            return Err(ApprovalError::NotPending { approval_id });
        }
        if approval.expires_at.is_some_and(|exp| exp < Utc::now()) {
            approval.resolve(ApprovalStatus::Expired);
            self.repository.save(approval.clone()).await?;
            self.emit_resolved(&approval);
            return Err(ApprovalError::Expired { approval_id });
        }
        if approval.has_acted(&user_id) {
            return Err(ApprovalError::AlreadyActed {
                approval_id,
                user_id,
            });
        }

        approval.record_action(user_id.clone(), decision.clone(), comment);
        self.events.emit(ExecutionEvent::ApprovalAction {
            approval_id: approval_id.to_string(),
            user_id,
            action: match decision {
                ApprovalDecision::Approve => "approve".to_string(),
                ApprovalDecision::Reject => "reject".to_string(),
            },
        });

        if let Some(resolution) = Self::resolution(&approval) {
            approval.resolve(resolution);
            self.repository.save(approval.clone()).await?;
            self.emit_resolved(&approval);
        } else {
            self.repository.save(approval.clone()).await?;
        }

        Ok(approval)
    }

    /// Apply the mode's quorum rules, returning the terminal status if
    /// the approval is now resolved.
    fn resolution(approval: &Approval) -> Option<ApprovalStatus> {
        let approved = approval.approved_count();
        let rejected = approval.rejected_count();
        let required = approval.required_approvers;

        match approval.mode {
            ApprovalMode::Any => {
                if approved > 0 {
                    Some(ApprovalStatus::Approved)
                } else if rejected > 0 {
                    Some(ApprovalStatus::Rejected)
                } else {
                    None
                }
            }
            ApprovalMode::All => {
                if approved >= required {
                    Some(ApprovalStatus::Approved)
                } else if rejected > 0 {
                    Some(ApprovalStatus::Rejected)
                } else {
                    None
                }
            }
            ApprovalMode::Majority => {
                if approved * 2 > required {
                    Some(ApprovalStatus::Approved)
                } else if rejected * 2 > required {
                    Some(ApprovalStatus::Rejected)
                } else {
                    None
                }
            }
        }
    }

    fn emit_resolved(&self, approval: &Approval) {
        let status = match approval.status {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Expired => "expired",
            ApprovalStatus::Cancelled => "cancelled",
            ApprovalStatus::Pending => "pending",
        };
        self.events.emit(ExecutionEvent::ApprovalResolved {
            approval_id: approval.approval_id.to_string(),
            status: status.to_string(),
        });
    }

    /// Spawn the periodic expiration sweep: every `interval`, find pending
    /// approvals whose `expires_at` has passed and mark them `expired`.
    ///
    /// Returns a handle; dropping it does not stop the task. Cancellation
    /// is via `shutdown`, checked at the top of each iteration, mirroring
    /// the resource crate's health-monitor loop.
    pub fn spawn_expiration_sweep(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: Arc<tokio::sync::RwLock<bool>>,
    ) -> tokio::task::JoinHandle<()> {
        let coordinator = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                if *shutdown.read().await {
                    break;
                }

                if let Err(err) = coordinator.sweep_expired().await {
                    tracing::warn!("approval expiration sweep failed: {err}");
                }

                tokio::time::sleep(interval).await;
            }
        })
    }

    /// Run one pass of the expiration sweep immediately.
    pub async fn sweep_expired(&self) -> Result<usize, ApprovalError> {
        let expired = self.repository.find_pending_expired(Utc::now()).await?;
        let count = expired.len();

        for mut approval in expired {
            approval.resolve(ApprovalStatus::Expired);
            if let Err(err) = self.repository.save(approval.clone()).await {
                tracing::warn!(
                    approval_id = %approval.approval_id,
                    "failed to persist expired approval: {err}"
                );
                continue;
            }
            self.emit_resolved(&approval);
        }

        Ok(count)
    }
}
