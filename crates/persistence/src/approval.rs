//! Durable approval records and their storage port.
//!
//! Types here are pure data: the resolution rules (what counts as
//! "approved" under `any`/`all`/`majority`) live in `nebula-approval`, which
//! depends on this crate for storage. Keeping the math out of the record
//! type means a different backend can store the same shape without
//! duplicating policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_core::{ApprovalActionId, ApprovalId, ExecutionId, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// How many approval actions are required to resolve an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Resolves on the first approve or reject.
    Any,
    /// Every required approver must approve for the approval to resolve as approved.
    All,
    /// Resolves as approved once more than half of the required approvers approve.
    Majority,
}

/// Lifecycle status of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting actions.
    Pending,
    /// Resolved as approved.
    Approved,
    /// Resolved as rejected.
    Rejected,
    /// Expired before enough actions were recorded.
    Expired,
    /// Cancelled by the workflow (e.g. the execution itself was cancelled).
    Cancelled,
}

impl ApprovalStatus {
    /// Returns `true` if no further actions can change this approval.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// An individual approve/reject decision recorded against an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// The approver approved.
    Approve,
    /// The approver rejected.
    Reject,
}

/// A single recorded action against an [`Approval`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalActionRecord {
    /// Unique id for this action.
    pub action_id: ApprovalActionId,
    /// The user who acted.
    pub user_id: String,
    /// Approve or reject.
    pub decision: ApprovalDecision,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// When the action was recorded.
    pub acted_at: DateTime<Utc>,
}

/// A durable approval gate suspending a single node of an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    /// Unique id for this approval.
    pub approval_id: ApprovalId,
    /// The execution it is suspending.
    pub execution_id: ExecutionId,
    /// The node that requested the approval.
    pub node_id: NodeId,
    /// Resolution policy.
    pub mode: ApprovalMode,
    /// Number of distinct approvers required to resolve this approval.
    pub required_approvers: u32,
    /// Current status.
    pub status: ApprovalStatus,
    /// Actions recorded so far, in the order they arrived.
    #[serde(default)]
    pub actions: Vec<ApprovalActionRecord>,
    /// Message shown to approvers.
    pub message: String,
    /// When the approval was created.
    pub created_at: DateTime<Utc>,
    /// When the approval expires if unresolved.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the approval was resolved, if it has been.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Approval {
    /// Create a new pending approval.
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        node_id: NodeId,
        mode: ApprovalMode,
        required_approvers: u32,
        message: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            approval_id: ApprovalId::v4(),
            execution_id,
            node_id,
            mode,
            required_approvers,
            status: ApprovalStatus::Pending,
            actions: Vec::new(),
            message: message.into(),
            created_at: Utc::now(),
            expires_at,
            resolved_at: None,
        }
    }

    /// Number of recorded approve actions.
    #[must_use]
    pub fn approved_count(&self) -> u32 {
        self.actions
            .iter()
            .filter(|a| a.decision == ApprovalDecision::Approve)
            .count() as u32
    }

    /// Number of recorded reject actions.
    #[must_use]
    pub fn rejected_count(&self) -> u32 {
        self.actions
            .iter()
            .filter(|a| a.decision == ApprovalDecision::Reject)
            .count() as u32
    }

    /// Returns `true` if a given user has already acted on this approval.
    #[must_use]
    pub fn has_acted(&self, user_id: &str) -> bool {
        self.actions.iter().any(|a| a.user_id == user_id)
    }

    /// Record an action, returning the updated action list entry.
    pub fn record_action(&mut self, user_id: String, decision: ApprovalDecision, comment: Option<String>) {
        self.actions.push(ApprovalActionRecord {
            action_id: ApprovalActionId::v4(),
            user_id,
            decision,
            comment,
            acted_at: Utc::now(),
        });
    }

    /// Mark resolved with the given terminal status.
    pub fn resolve(&mut self, status: ApprovalStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

/// Repository port for durable [`Approval`] storage.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Insert or overwrite an approval.
    async fn save(&self, approval: Approval) -> Result<(), PersistenceError>;

    /// Fetch an approval by id.
    async fn get(&self, approval_id: ApprovalId) -> Result<Option<Approval>, PersistenceError>;

    /// Find pending approvals whose `expires_at` is before `now` — the
    /// expiration sweep's batch-selection query.
    async fn find_pending_expired(&self, now: DateTime<Utc>) -> Result<Vec<Approval>, PersistenceError>;

    /// Remove an approval's durable record.
    async fn delete(&self, approval_id: ApprovalId) -> Result<(), PersistenceError>;
}

/// In-memory [`ApprovalRepository`] reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryApprovalRepository {
    approvals: DashMap<ApprovalId, Approval>,
}

impl InMemoryApprovalRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored approvals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    /// Returns `true` if no approvals are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }
}

#[async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn save(&self, approval: Approval) -> Result<(), PersistenceError> {
        self.approvals.insert(approval.approval_id, approval);
        Ok(())
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_approval() -> Approval {
        Approval::new(
            ExecutionId::v4(),
            NodeId::v4(),
            ApprovalMode::Majority,
            3,
            "please review",
            Some(Utc::now() + chrono::Duration::hours(1)),
        )
    }

    #[test]
    fn new_approval_is_pending() {
        let approval = make_approval();
        assert_eq!(approval.status, ApprovalStatus::Pending);
        assert!(approval.actions.is_empty());
        assert_eq!(approval.approved_count(), 0);
    }

    #[test]
    fn record_action_and_count() {
        let mut approval = make_approval();
        approval.record_action("alice".into(), ApprovalDecision::Approve, None);
        approval.record_action("bob".into(), ApprovalDecision::Reject, Some("no".into()));

        assert_eq!(approval.approved_count(), 1);
        assert_eq!(approval.rejected_count(), 1);
        assert!(approval.has_acted("alice"));
        assert!(!approval.has_acted("carol"));
    }

    #[test]
    fn resolve_sets_status_and_timestamp() {
        let mut approval = make_approval();
        approval.resolve(ApprovalStatus::Approved);
        assert_eq!(approval.status, ApprovalStatus::Approved);
        assert!(approval.status.is_terminal());
        assert!(approval.resolved_at.is_some());
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let repo = InMemoryApprovalRepository::new();
        let approval = make_approval();
        let id = approval.approval_id;
        repo.save(approval).await.unwrap();

        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.approval_id, id);
    }

    #[tokio::test]
    async fn find_pending_expired_filters_correctly() {
        let repo = InMemoryApprovalRepository::new();

        let mut expired = make_approval();
        expired.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        repo.save(expired).await.unwrap();

        let mut not_expired = make_approval();
        not_expired.expires_at = Some(Utc::now() + chrono::Duration::hours(1));
        repo.save(not_expired).await.unwrap();

        let mut resolved = make_approval();
        resolved.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        resolved.resolve(ApprovalStatus::Approved);
        repo.save(resolved).await.unwrap();

        let found = repo.find_pending_expired(Utc::now()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let repo = InMemoryApprovalRepository::new();
        let approval = make_approval();
        let id = approval.approval_id;
        repo.save(approval).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_none());
    }
}
