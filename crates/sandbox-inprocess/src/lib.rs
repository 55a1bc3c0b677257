#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula In-Process Sandbox Driver
//!
//! Implements the [`SandboxRunner`] port by executing actions directly in
//! the current process. Capability checks are enforced via the
//! [`SandboxedContext`] -- the action can only access resources that
//! were explicitly granted.
//!
//! This driver is used for trusted single-process deployments where WASM
//! isolation is not needed.
//!
//! # Architecture
//!
//! The sandbox receives an **action executor** callback at construction
//! time. The runtime provides this callback, which knows how to look up
//! the action by key and invoke it. The sandbox's responsibility is
//! limited to capability validation and execution boundaries.

use std::sync::Arc;

use async_trait::async_trait;
use nebula_action::result::ActionResult;
use nebula_action::{ActionError, ActionMetadata, SandboxRunner, SandboxedContext};

/// Boxed future returned by the action executor.
pub type ActionExecutorFuture = std::pin::Pin<
    Box<
        dyn std::future::Future<Output = Result<ActionResult<serde_json::Value>, ActionError>>
            + Send,
    >,
>;

/// Callback type for executing an action.
///
/// The runtime provides this function, which:
/// 1. Looks up the action by key from `ActionMetadata`
/// 2. Invokes it with the given context and input
/// 3. Returns the output or error
pub type ActionExecutor = Arc<
    dyn Fn(SandboxedContext, &ActionMetadata, serde_json::Value) -> ActionExecutorFuture
        + Send
        + Sync,
>;

/// In-process sandbox that executes actions in the same process.
///
/// Capability checks are handled by [`SandboxedContext`] -- when the
/// action tries to access a resource, the context validates against
/// the granted capabilities.
pub struct InProcessSandbox {
    executor: ActionExecutor,
}

impl InProcessSandbox {
    /// Create a new in-process sandbox with the given action executor.
    pub fn new(executor: ActionExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl SandboxRunner for InProcessSandbox {
    async fn execute(
        &self,
        context: SandboxedContext,
        metadata: &ActionMetadata,
        input: serde_json::Value,
    ) -> Result<ActionResult<serde_json::Value>, ActionError> {
        tracing::debug!(
            action_key = %metadata.key,
            isolation = ?metadata.isolation_level,
            "executing action in-process"
        );

        context.check_cancelled()?;

        let result = (self.executor)(context, metadata, input).await;

        match &result {
            Ok(_) => {
                tracing::debug!(action_key = %metadata.key, "action completed successfully");
            }
            Err(e) => {
                tracing::warn!(action_key = %metadata.key, error = %e, "action failed");
            }
        }

        result
    }
}
