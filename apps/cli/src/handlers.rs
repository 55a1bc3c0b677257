//! Built-in node types the CLI ships with.
//!
//! Concrete node handlers (HTTP, database, transform, ...) live outside this
//! workspace; what's here is the minimal vocabulary needed to author and run
//! a workflow end to end: pass data through, branch on it, suspend on an
//! approval or form gate, and fail on demand (for exercising error triggers).
//! Each is registered under its `node_type` string, which
//! [`crate::workflow_io::map_actions`] uses as the registry key for every
//! node whose `node_type` matches.

use std::sync::Arc;

use nebula_action::context::ActionContext;
use nebula_action::error::ActionError;
use nebula_action::handler::InternalHandler;
use nebula_action::metadata::{ActionMetadata, ActionType};
use nebula_action::result::{ActionResult, WaitCondition};
use nebula_action::capability::IsolationLevel;
use nebula_parameter::collection::ParameterCollection;
use nebula_approval::ApprovalCoordinator;
use nebula_form::FormCoordinator;
use nebula_persistence::ApprovalMode;
use nebula_runtime::registry::ActionRegistry;

/// Node type key for the pass-through action.
pub const ECHO: &str = "echo";
/// Node type key for the field-assignment action (same pass-through
/// semantics as `echo` once the engine has resolved its parameters).
pub const SET: &str = "set";
/// Node type key for the branching action.
pub const SWITCH: &str = "switch";
/// Node type key for the approval-gated suspend action.
pub const WAIT_APPROVAL: &str = "wait.approval";
/// Node type key for the form-gated suspend action.
pub const WAIT_FORM: &str = "wait.form";
/// Node type key for the always-fails action.
pub const FAIL: &str = "fail";

/// Returns its input unchanged. Used for `echo` and `set` nodes: by the
/// time a node's handler runs, the engine has already resolved its
/// parameters into the input payload, so there is nothing left for either
/// to do but forward it.
struct PassThroughHandler {
    meta: ActionMetadata,
}

#[async_trait::async_trait]
impl InternalHandler for PassThroughHandler {
    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        Ok(ActionResult::success(input))
    }
    fn metadata(&self) -> &ActionMetadata {
        &self.meta
    }
    fn action_type(&self) -> ActionType {
        ActionType::Process
    }
    fn parameters(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Branches on `input.branch` (or `input` itself, if it's a bare string),
/// falling back to a `"default"` handle.
struct SwitchHandler {
    meta: ActionMetadata,
}

#[async_trait::async_trait]
impl InternalHandler for SwitchHandler {
    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        let selected = input
            .get("branch")
            .and_then(|v| v.as_str())
            .or_else(|| input.as_str())
            .unwrap_or("default")
            .to_owned();
        Ok(ActionResult::Branch {
            selected,
            output: input,
            alternatives: std::collections::HashMap::new(),
        })
    }
    fn metadata(&self) -> &ActionMetadata {
        &self.meta
    }
    fn action_type(&self) -> ActionType {
        ActionType::Process
    }
    fn parameters(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Creates an approval gate through the shared coordinator and suspends the
/// node on it. `input.message`, `input.mode` (`"any"`/`"all"`/`"majority"`,
/// default `"any"`), and `input.requiredApprovers` (default `1`) configure
/// the gate; everything else in `input` is carried as the wait's partial
/// output.
struct WaitApprovalHandler {
    meta: ActionMetadata,
    coordinator: Arc<ApprovalCoordinator>,
}

#[async_trait::async_trait]
impl InternalHandler for WaitApprovalHandler {
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("approval required")
            .to_owned();
        let mode = match input.get("mode").and_then(|v| v.as_str()) {
            Some("all") => ApprovalMode::All,
            Some("majority") => ApprovalMode::Majority,
            _ => ApprovalMode::Any,
        };
        let required = input
            .get("requiredApprovers")
            .and_then(|v| v.as_u64())
            .unwrap_or(1) as u32;

        let approval = self
            .coordinator
            .create_approval(ctx.execution_id, ctx.node_id, mode, required, message.clone(), None)
            .await
            .map_err(|e| ActionError::fatal(e.to_string()))?;

        Ok(ActionResult::Wait {
            condition: WaitCondition::Approval {
                approval_id: approval.approval_id.to_string(),
                message,
            },
            timeout: None,
            partial_output: Some(input),
        })
    }
    fn metadata(&self) -> &ActionMetadata {
        &self.meta
    }
    fn action_type(&self) -> ActionType {
        ActionType::Process
    }
    fn parameters(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Creates (or reuses) a form trigger for this node through the shared
/// coordinator and suspends on it. `input.maxSubmissions` (default `1`)
/// configures the submission cap.
struct WaitFormHandler {
    meta: ActionMetadata,
    coordinator: Arc<FormCoordinator>,
}

#[async_trait::async_trait]
impl InternalHandler for WaitFormHandler {
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        let max_submissions = input
            .get("maxSubmissions")
            .and_then(|v| v.as_u64())
            .unwrap_or(1) as u32;

        let trigger = self
            .coordinator
            .create_or_update_trigger(
                ctx.workflow_id,
                ctx.node_id,
                input.clone(),
                None,
                max_submissions,
                "nebula-cli",
            )
            .await
            .map_err(|e| ActionError::fatal(e.to_string()))?;

        Ok(ActionResult::Wait {
            condition: WaitCondition::Form {
                form_token: trigger.token,
            },
            timeout: None,
            partial_output: Some(input),
        })
    }
    fn metadata(&self) -> &ActionMetadata {
        &self.meta
    }
    fn action_type(&self) -> ActionType {
        ActionType::Process
    }
    fn parameters(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Always fails, with `input.message` as the error (default
/// `"configured to fail"`). Exists to exercise error-trigger routing.
struct FailHandler {
    meta: ActionMetadata,
}

#[async_trait::async_trait]
impl InternalHandler for FailHandler {
    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("configured to fail")
            .to_owned();
        Err(ActionError::fatal(message))
    }
    fn metadata(&self) -> &ActionMetadata {
        &self.meta
    }
    fn action_type(&self) -> ActionType {
        ActionType::Process
    }
    fn parameters(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Build a registry with every built-in node type registered, wired to the
/// approval/form coordinators so `wait.approval`/`wait.form` nodes suspend
/// through the same durable gates the CLI's `approval`/`form` subcommands
/// operate on.
pub fn build_registry(
    approvals: Arc<ApprovalCoordinator>,
    forms: Arc<FormCoordinator>,
) -> ActionRegistry {
    let registry = ActionRegistry::new();

    registry.register(Arc::new(PassThroughHandler {
        meta: ActionMetadata::new(ECHO, "Echo", "returns its input unchanged")
            .with_isolation(IsolationLevel::None),
    }));
    registry.register(Arc::new(PassThroughHandler {
        meta: ActionMetadata::new(SET, "Set", "assigns configured fields")
            .with_isolation(IsolationLevel::None),
    }));
    registry.register(Arc::new(SwitchHandler {
        meta: ActionMetadata::new(SWITCH, "Switch", "branches on input")
            .with_isolation(IsolationLevel::None),
    }));
    registry.register(Arc::new(WaitApprovalHandler {
        meta: ActionMetadata::new(WAIT_APPROVAL, "Wait for Approval", "suspends on an approval gate")
            .with_isolation(IsolationLevel::None),
        coordinator: approvals,
    }));
    registry.register(Arc::new(WaitFormHandler {
        meta: ActionMetadata::new(WAIT_FORM, "Wait for Form", "suspends on a form trigger")
            .with_isolation(IsolationLevel::None),
        coordinator: forms,
    }));
    registry.register(Arc::new(FailHandler {
        meta: ActionMetadata::new(FAIL, "Fail", "always fails").with_isolation(IsolationLevel::None),
    }));

    registry
}

/// All built-in node type keys, for `--help` text and `workflow validate`'s
/// unknown-type warnings.
pub const BUILTIN_NODE_TYPES: &[&str] = &[ECHO, SET, SWITCH, WAIT_APPROVAL, WAIT_FORM, FAIL];
