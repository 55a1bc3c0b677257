//! Action runtime -- the main execution orchestrator.
//!
//! Resolves actions from the registry, executes them through the sandbox,
//! enforces data limits, and emits telemetry events.

use std::sync::Arc;
use std::time::Instant;

use nebula_action::SandboxedContext;
use nebula_action::SandboxRunner;
use nebula_action::capability::IsolationLevel;
use nebula_action::context::ActionContext;
use nebula_action::result::ActionResult;
use nebula_telemetry::event::{EventBus, ExecutionEvent};
use nebula_telemetry::metrics::MetricsRegistry;

use crate::data_policy::{DataPassingPolicy, LargeDataStrategy};
use crate::error::RuntimeError;
use crate::registry::ActionRegistry;

/// The action runtime orchestrates execution of actions.
///
/// It sits between the engine (which schedules work) and the sandbox
/// (which provides isolation). The runtime:
///
/// 1. Looks up the action handler from the registry
/// 2. Resolves the isolation level
/// 3. Executes through the sandbox (if capability-gated/isolated)
///    or directly (if trusted)
/// 4. Enforces data passing policies on the output
/// 5. Emits telemetry events
pub struct ActionRuntime {
    registry: Arc<ActionRegistry>,
    sandbox: Arc<dyn SandboxRunner>,
    data_policy: DataPassingPolicy,
    event_bus: Arc<EventBus>,
    metrics: Arc<MetricsRegistry>,
}

impl ActionRuntime {
    /// Create a new runtime with the given components.
    pub fn new(
        registry: Arc<ActionRegistry>,
        sandbox: Arc<dyn SandboxRunner>,
        data_policy: DataPassingPolicy,
        event_bus: Arc<EventBus>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            registry,
            sandbox,
            data_policy,
            event_bus,
            metrics,
        }
    }

    /// Access the action registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Access the data passing policy.
    pub fn data_policy(&self) -> &DataPassingPolicy {
        &self.data_policy
    }

    /// Execute an action by key.
    ///
    /// # Flow
    ///
    /// 1. Look up action handler in the registry
    /// 2. Check isolation level from metadata
    /// 3. For `IsolationLevel::None` (trusted): execute directly
    /// 4. For `CapabilityGated`/`Isolated`: wrap context in
    ///    `SandboxedContext` and execute through the sandbox
    /// 5. Enforce data limits on the output
    /// 6. Emit telemetry events
    pub async fn execute_action(
        &self,
        action_key: &str,
        input: serde_json::Value,
        context: ActionContext,
    ) -> Result<ActionResult<serde_json::Value>, RuntimeError> {
        let handler = self.registry.get(action_key)?;
        let metadata = handler.metadata();
        let isolation = &metadata.isolation_level;
        let node_id = context.node_id.to_string();
        let execution_id = context.execution_id.to_string();

        self.event_bus.emit(ExecutionEvent::NodeStarted {
            execution_id: execution_id.clone(),
            node_id: node_id.clone(),
        });

        let started = Instant::now();
        let action_counter = self.metrics.counter("actions_executed_total");
        let error_counter = self.metrics.counter("actions_failed_total");
        let duration_hist = self.metrics.histogram("action_duration_seconds");

        let result = match isolation {
            IsolationLevel::None => {
                // Trusted: execute directly, no sandbox.
                tracing::debug!(action_key, "executing trusted action directly");
                handler.execute(input, context).await
            }
            IsolationLevel::CapabilityGated | IsolationLevel::Isolated => {
                // Wrap in SandboxedContext for capability checks.
                tracing::debug!(action_key, ?isolation, "executing action through sandbox");
                let sandboxed = SandboxedContext::new(context, metadata.capabilities.clone());
                self.sandbox.execute(sandboxed, metadata, input).await
            }
        };

        let elapsed = started.elapsed();
        duration_hist.observe(elapsed.as_secs_f64());
        action_counter.inc();

        match result {
            Ok(action_result) => {
                // Enforce data limits on the primary output value.
                self.enforce_data_limit(
                    action_key,
                    &action_result,
                    &error_counter,
                    &execution_id,
                    &node_id,
                )?;

                self.event_bus.emit(ExecutionEvent::NodeCompleted {
                    execution_id,
                    node_id,
                    duration: elapsed,
                });

                Ok(action_result)
            }
            Err(action_err) => {
                error_counter.inc();
                self.event_bus.emit(ExecutionEvent::NodeFailed {
                    execution_id,
                    node_id,
                    error: action_err.to_string(),
                });
                Err(RuntimeError::ActionError(action_err))
            }
        }
    }

    /// Check the primary output of an `ActionResult` against the data passing policy.
    ///
    /// Returns `Ok(())` if within limits or if using `SpillToBlob` strategy.
    /// Returns `Err(DataLimitExceeded)` if the output is too large and strategy is `Reject`.
    fn enforce_data_limit(
        &self,
        action_key: &str,
        action_result: &ActionResult<serde_json::Value>,
        error_counter: &nebula_telemetry::metrics::Counter,
        execution_id: &str,
        node_id: &str,
    ) -> Result<(), RuntimeError> {
        let output = match primary_output(action_result) {
            Some(o) => o,
            None => return Ok(()),
        };

        let (limit, actual) = match self.data_policy.check_output_size(output) {
            Ok(_) => return Ok(()),
            Err(exceeded) => exceeded,
        };

        error_counter.inc();
        self.event_bus.emit(ExecutionEvent::NodeFailed {
            execution_id: execution_id.to_owned(),
            node_id: node_id.to_owned(),
            error: format!("data limit exceeded: {actual} > {limit}"),
        });

        match self.data_policy.large_data_strategy {
            LargeDataStrategy::Reject => Err(RuntimeError::DataLimitExceeded {
                limit_bytes: limit,
                actual_bytes: actual,
            }),
            LargeDataStrategy::SpillToBlob => {
                // Phase 2: spill to blob storage.
                tracing::warn!(
                    action_key,
                    actual,
                    limit,
                    "output exceeds limit, spill to blob not yet implemented"
                );
                Ok(())
            }
        }
    }
}

/// Extract the primary output value from an `ActionResult` for size checking.
fn primary_output(result: &ActionResult<serde_json::Value>) -> Option<&serde_json::Value> {
    match result {
        ActionResult::Success { output } => Some(output),
        ActionResult::Skip { output, .. } => output.as_ref(),
        ActionResult::Continue { output, .. } => Some(output),
        ActionResult::Break { output, .. } => Some(output),
        ActionResult::Branch { output, .. } => Some(output),
        ActionResult::Route { data, .. } => Some(data),
        ActionResult::MultiOutput { main_output, .. } => main_output.as_ref(),
        ActionResult::Wait { partial_output, .. } => partial_output.as_ref(),
    }
}
