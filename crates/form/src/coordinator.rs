//! Form trigger lifecycle: creation/update, submission, and token rotation.

use std::sync::Arc;

use chrono::Utc;
use nebula_core::{ExecutionId, FormTriggerId, NodeId, WorkflowId};
use nebula_persistence::{FormSubmission, FormTrigger, FormTriggerRepository};
use tokio::sync::mpsc;

use crate::error::FormError;
use crate::token::generate_token;

/// A `(execution_id, node_id)` pair whose suspended node should be
/// re-evaluated for readiness after a form submission lands.
pub type ResumeSignal = (ExecutionId, NodeId);

/// Coordinates form triggers: `createOrUpdateFormTrigger`, `submit`, and
/// `regenerateToken`.
///
/// Unlike the approval coordinator, form submissions have no entry in the
/// event catalog (only execution/node/approval events are published there)
/// — resumption is signaled directly to whoever owns the scheduler's
/// readiness loop via an unbounded channel, rather than broadcast on the
/// event bus.
pub struct FormCoordinator {
    repository: Arc<dyn FormTriggerRepository>,
    resume_tx: mpsc::UnboundedSender<ResumeSignal>,
}

impl FormCoordinator {
    /// Build a coordinator over the given repository. Returns the
    /// coordinator alongside the receiving half of the resume channel,
    /// which the scheduler should drain to re-arm suspended executions.
    #[must_use]
    pub fn new(
        repository: Arc<dyn FormTriggerRepository>,
    ) -> (Self, mpsc::UnboundedReceiver<ResumeSignal>) {
        let (resume_tx, resume_rx) = mpsc::unbounded_channel();
        (
            Self {
                repository,
                resume_tx,
            },
            resume_rx,
        )
    }

    /// Create a fresh trigger for `(workflow_id, node_id)`, or update the
    /// existing one in place (keeping its token). Idempotent on the
    /// `(workflow_id, node_id)` key.
    pub async fn create_or_update_trigger(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        config: serde_json::Value,
        expires_in_days: Option<i64>,
        max_submissions: u32,
        creator: impl Into<String>,
    ) -> Result<FormTrigger, FormError> {
        let expires_at = expires_in_days.map(|days| Utc::now() + chrono::Duration::days(days));

        if let Some(mut existing) = self.repository.get_by_flow_node(workflow_id, node_id).await? {
            existing.config = config;
            existing.expires_at = expires_at;
            existing.max_submissions = max_submissions;
            existing.active = true;
            existing.updated_at = Utc::now();
            self.repository.save(existing.clone()).await?;
            return Ok(existing);
        }

        let trigger = FormTrigger::new(
            workflow_id,
            node_id,
            generate_token(),
            max_submissions,
            creator,
            config,
            expires_at,
        );
        self.repository.save(trigger.clone()).await?;
        Ok(trigger)
    }

    /// Fetch a trigger by its public token.
    pub async fn get_by_token(&self, token: &str) -> Result<FormTrigger, FormError> {
        self.repository
            .get_by_token(token)
            .await?
            .ok_or(FormError::UnknownToken)
    }

    /// Record a submission against the trigger addressed by `node_id`'s
    /// form, resuming `execution_id` at `node_id`.
    ///
    /// Fails if a submission for this `(execution_id, node_id)` pair was
    /// already recorded, or if the trigger is inactive, expired, or at its
    /// submission cap.
    pub async fn submit(
        &self,
        workflow_id: WorkflowId,
        execution_id: ExecutionId,
        node_id: NodeId,
        data: serde_json::Value,
        submitted_by: Option<String>,
        submitted_ip: Option<String>,
    ) -> Result<FormSubmission, FormError> {
        let mut trigger = self
            .repository
            .get_by_flow_node(workflow_id, node_id)
            .await?
            .ok_or(FormError::NoTriggerForNode {
                workflow_id,
                node_id,
            })?;

        let existing = self
            .repository
            .submissions_for(execution_id, node_id)
            .await?;
        if !existing.is_empty() {
            return Err(FormError::AlreadySubmitted);
        }

        if !trigger.accepts_submissions() {
            return Err(FormError::NotAccepting {
                trigger_id: trigger.trigger_id,
            });
        }

        let submission = FormSubmission::new(
            trigger.trigger_id,
            execution_id,
            node_id,
            data,
            submitted_by,
            submitted_ip,
        );
        self.repository.save_submission(submission.clone()).await?;

        trigger.record_submission();
        self.repository.save(trigger).await?;

        let _ = self.resume_tx.send((execution_id, node_id));

        Ok(submission)
    }

    /// Rotate a trigger's token atomically, invalidating the old one.
    pub async fn regenerate_token(&self, trigger_id: FormTriggerId) -> Result<FormTrigger, FormError> {
        let mut trigger = self
            .repository
            .get_by_id(trigger_id)
            .await?
            .ok_or(FormError::NotFound { trigger_id })?;

        trigger.rotate_token(generate_token());
        self.repository.save(trigger.clone()).await?;
        Ok(trigger)
    }
}
