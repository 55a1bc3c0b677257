//! Durable form trigger and submission records, and their storage ports.
//!
//! A [`FormTrigger`] is the long-lived webhook-style endpoint a flow node
//! configures once; a [`FormSubmission`] is a single POST against it while a
//! specific execution is suspended waiting for it. The token-rotation and
//! submission-count bookkeeping policy lives in `nebula-form`; this crate
//! only owns the shapes and the storage port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_core::{ExecutionId, FormSubmissionId, FormTriggerId, NodeId, WorkflowId};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// A configured form endpoint on a single flow node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTrigger {
    /// Unique id for this trigger.
    pub trigger_id: FormTriggerId,
    /// The flow this trigger belongs to.
    pub workflow_id: WorkflowId,
    /// The node that owns this trigger.
    pub node_id: NodeId,
    /// Opaque, URL-safe token used to address this trigger without
    /// authentication (possession of the token is the credential).
    pub token: String,
    /// Whether submissions are currently accepted.
    pub active: bool,
    /// Optional absolute expiry after which submissions are rejected.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum submissions accepted in this trigger's lifetime. `0` means
    /// unlimited.
    pub max_submissions: u32,
    /// Submissions accepted so far.
    #[serde(default)]
    pub submission_count: u32,
    /// Identity of whoever configured this trigger.
    pub creator: String,
    /// Opaque per-node form configuration (field schema, etc).
    #[serde(default)]
    pub config: serde_json::Value,
    /// When this trigger was created.
    pub created_at: DateTime<Utc>,
    /// When this trigger was last updated (e.g. token rotation).
    pub updated_at: DateTime<Utc>,
}

impl FormTrigger {
    /// Create a new active trigger with a freshly generated token.
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        node_id: NodeId,
        token: String,
        max_submissions: u32,
        creator: impl Into<String>,
        config: serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trigger_id: FormTriggerId::v4(),
            workflow_id,
            node_id,
            token,
            active: true,
            expires_at,
            max_submissions,
            submission_count: 0,
            creator: creator.into(),
            config,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if this trigger can currently accept a submission.
    #[must_use]
    pub fn accepts_submissions(&self) -> bool {
        if !self.active {
            return false;
        }
        if self.expires_at.is_some_and(|exp| exp < Utc::now()) {
            return false;
        }
        self.max_submissions == 0 || self.submission_count < self.max_submissions
    }

    /// Record a successful submission against this trigger.
    pub fn record_submission(&mut self) {
        self.submission_count += 1;
        self.updated_at = Utc::now();
    }

    /// Replace the token, invalidating the old one.
    pub fn rotate_token(&mut self, new_token: String) {
        self.token = new_token;
        self.updated_at = Utc::now();
    }
}

/// A single accepted POST against a [`FormTrigger`], tied to the execution
/// it unblocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    /// Unique id for this submission.
    pub submission_id: FormSubmissionId,
    /// The trigger this submission was made against.
    pub trigger_id: FormTriggerId,
    /// The execution this submission resumes.
    pub execution_id: ExecutionId,
    /// The node waiting on this submission.
    pub node_id: NodeId,
    /// The submitted payload.
    pub data: serde_json::Value,
    /// Identity of the submitter, if known.
    #[serde(default)]
    pub submitted_by: Option<String>,
    /// Source IP of the submission, if captured.
    #[serde(default)]
    pub submitted_ip: Option<String>,
    /// When the submission was accepted.
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    /// Record a new submission.
    #[must_use]
    pub fn new(
        trigger_id: FormTriggerId,
        execution_id: ExecutionId,
        node_id: NodeId,
        data: serde_json::Value,
        submitted_by: Option<String>,
        submitted_ip: Option<String>,
    ) -> Self {
        Self {
            submission_id: FormSubmissionId::v4(),
            trigger_id,
            execution_id,
            node_id,
            data,
            submitted_by,
            submitted_ip,
            submitted_at: Utc::now(),
        }
    }
}

/// Repository port for durable [`FormTrigger`] storage and lookup.
#[async_trait]
pub trait FormTriggerRepository: Send + Sync {
    /// Insert or overwrite a trigger.
    async fn save(&self, trigger: FormTrigger) -> Result<(), PersistenceError>;

    /// Fetch a trigger by id.
    async fn get_by_id(&self, trigger_id: FormTriggerId) -> Result<Option<FormTrigger>, PersistenceError>;

    /// Fetch a trigger by its public token — the hot path for an inbound
    /// submission request.
    async fn get_by_token(&self, token: &str) -> Result<Option<FormTrigger>, PersistenceError>;

    /// Fetch the trigger configured for a given `(workflow_id, node_id)`
    /// pair, if one exists — used by `createOrUpdateFormTrigger` to decide
    /// between insert and update.
    async fn get_by_flow_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
    ) -> Result<Option<FormTrigger>, PersistenceError>;

    /// Remove a trigger's durable record.
    async fn delete(&self, trigger_id: FormTriggerId) -> Result<(), PersistenceError>;

    /// Record a submission against a trigger.
    async fn save_submission(&self, submission: FormSubmission) -> Result<(), PersistenceError>;

    /// List submissions recorded for a given `(execution_id, node_id)` pair
    /// — used to enforce the one-submission-per-execution invariant.
    async fn submissions_for(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Result<Vec<FormSubmission>, PersistenceError>;
}

/// In-memory [`FormTriggerRepository`] reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryFormTriggerRepository {
    triggers: DashMap<FormTriggerId, FormTrigger>,
    submissions: DashMap<FormSubmissionId, FormSubmission>,
}

impl InMemoryFormTriggerRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns `true` if no triggers are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[async_trait]
impl FormTriggerRepository for InMemoryFormTriggerRepository {
    async fn save(&self, trigger: FormTrigger) -> Result<(), PersistenceError> {
        self.triggers.insert(trigger.trigger_id, trigger);
        Ok(())
    }

    async fn get_by_id(&self, trigger_id: FormTriggerId) -> Result<Option<FormTrigger>, PersistenceError> {
        Ok(self.triggers.get(&trigger_id).map(|t| t.clone()))
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<FormTrigger>, PersistenceError> {
        Ok(self
            .triggers
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.clone()))
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
        Ok(())
    }

    async fn save_submission(&self, submission: FormSubmission) -> Result<(), PersistenceError> {
        self.submissions.insert(submission.submission_id, submission);
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trigger(workflow_id: WorkflowId, node_id: NodeId) -> FormTrigger {
        FormTrigger::new(
            workflow_id,
            node_id,
            "tok_abc123".to_string(),
            1,
            "alice",
            serde_json::json!({"fields": []}),
            None,
        )
    }

    #[test]
    fn accepts_submissions_respects_max() {
        let mut trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        assert!(trigger.accepts_submissions());
        trigger.record_submission();
        assert!(!trigger.accepts_submissions());
    }

    #[test]
    fn unlimited_submissions_when_max_is_zero() {
        let mut trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        trigger.max_submissions = 0;
        for _ in 0..10 {
            trigger.record_submission();
        }
        assert!(trigger.accepts_submissions());
    }

    #[test]
    fn expired_trigger_rejects_submissions() {
        let mut trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        trigger.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        assert!(!trigger.accepts_submissions());
    }

    #[test]
    fn rotate_token_replaces_value() {
        let mut trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        trigger.rotate_token("tok_new".to_string());
        assert_eq!(trigger.token, "tok_new");
    }

    #[tokio::test]
    async fn save_and_get_by_token() {
        let repo = InMemoryFormTriggerRepository::new();
        let trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        let token = trigger.token.clone();
        repo.save(trigger).await.unwrap();

        let found = repo.get_by_token(&token).await.unwrap().unwrap();
        assert_eq!(found.token, token);
        assert!(repo.get_by_token("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_by_flow_node_finds_exact_match() {
        let repo = InMemoryFormTriggerRepository::new();
        let workflow_id = WorkflowId::v4();
        let node_id = NodeId::v4();
        repo.save(make_trigger(workflow_id, node_id)).await.unwrap();
        repo.save(make_trigger(WorkflowId::v4(), NodeId::v4())).await.unwrap();

        let found = repo.get_by_flow_node(workflow_id, node_id).await.unwrap();
        assert!(found.is_some());
        assert!(repo
            .get_by_flow_node(WorkflowId::v4(), NodeId::v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn submissions_for_filters_by_execution_and_node() {
        let repo = InMemoryFormTriggerRepository::new();
        let trigger = make_trigger(WorkflowId::v4(), NodeId::v4());
        let trigger_id = trigger.trigger_id;
        let node_id = trigger.node_id;
        repo.save(trigger).await.unwrap();

        let exec_id = ExecutionId::v4();
        repo.save_submission(FormSubmission::new(
            trigger_id,
            exec_id,
            node_id,
            serde_json::json!({"ok": true}),
            Some("bob".into()),
            None,
        ))
        .await
        .unwrap();

        let found = repo.submissions_for(exec_id, node_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo
            .submissions_for(ExecutionId::v4(), node_id)
            .await
            .unwrap()
            .is_empty());
    }
}
