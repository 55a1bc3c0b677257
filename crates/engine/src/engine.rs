//! Workflow execution engine.
//!
//! Runs a workflow as a readiness-driven scheduler: nodes dispatch the
//! moment every predecessor has resolved (completed-and-selected, or
//! skipped), not in level-synchronized batches. Branching narrows the
//! reachable subgraph, suspension parks the execution without losing
//! in-flight work, and a failed node first looks for a matching error
//! trigger before failing the whole execution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use nebula_action::ExecutionBudget;
use nebula_action::context::{ActionContext, CredentialProvider, ResourceProvider};
use nebula_action::error::ActionError;
use nebula_action::result::{ActionResult, WaitCondition};
use nebula_core::id::{ActionId, ExecutionId, NodeId, WorkflowId};
use nebula_core::scope::ScopeLevel;
use nebula_credential::CredentialResolver;
use nebula_execution::ExecutionStatus;
use nebula_execution::state::ExecutionState;
use nebula_expression::ExpressionEngine;
use nebula_runtime::ActionRuntime;
use nebula_telemetry::event::{EventBus, ExecutionEvent};
use nebula_telemetry::metrics::MetricsRegistry;
use nebula_workflow::{Connection, DependencyGraph, NodeDefinition, NodeState, WorkflowDefinition};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use nebula_node::NodeRegistry;

use crate::error::EngineError;
use crate::resolver::ParamResolver;
use crate::result::ExecutionResult;

/// Soft per-node timeout used when a workflow does not set
/// `config.node_timeout_ms` (`worker.defaultNodeTimeoutMs`).
const DEFAULT_NODE_TIMEOUT_MS: u64 = 300_000;

/// The workflow execution engine.
///
/// Orchestrates end-to-end execution of workflow definitions by:
///
/// 1. Building a dependency graph from the workflow's nodes and connections
/// 2. Dispatching each node as soon as it becomes ready, bounded by a
///    per-execution concurrency semaphore
/// 3. Resolving each node's input and parameters via the expression engine
/// 4. Delegating action execution to the [`ActionRuntime`]
/// 5. Propagating branch/skip decisions, suspending on `Wait`, and routing
///    failures to matching error triggers
/// 6. Tracking execution state and emitting telemetry
pub struct WorkflowEngine {
    runtime: Arc<ActionRuntime>,
    event_bus: Arc<EventBus>,
    metrics: Arc<MetricsRegistry>,
    expression_engine: Arc<ExpressionEngine>,
    /// Maps action IDs (from node definitions) to registry keys.
    action_keys: HashMap<ActionId, String>,
    /// Node registry for node-level metadata and versioning.
    node_registry: NodeRegistry,
    /// Optional resource manager. When set, every action's [`ActionContext`]
    /// is given a resource provider backed by this manager.
    resource_manager: Option<Arc<nebula_resource::Manager>>,
    /// Optional credential resolver. When set, a node with `credential_id`
    /// set gets a credential provider backed by this resolver, scoped to
    /// `credential_user_id`.
    credential_resolver: Option<Arc<dyn CredentialResolver>>,
    /// The user on whose behalf credentials are resolved. Required for
    /// `credential_resolver` to take effect.
    credential_user_id: Option<String>,
    /// Names of process environment variables exposed to node parameters as
    /// `$env.*`. Anything not named here resolves to `null` rather than
    /// leaking the full process environment into workflow expressions.
    env_allowlist: Vec<String>,
    /// Cancellation tokens for every in-flight execution, keyed by execution
    /// id. Populated for the duration of `execute_workflow`/`resume_workflow`
    /// so an external caller can cancel a run it doesn't otherwise hold a
    /// handle to.
    cancel_tokens: Arc<DashMap<ExecutionId, CancellationToken>>,
}

/// Adapts a [`nebula_resource::Manager`] to the action crate's
/// [`ResourceProvider`] port, scoping every acquisition to the execution
/// and workflow the node task belongs to.
struct ManagerResourceProvider {
    manager: Arc<nebula_resource::Manager>,
    workflow_id: WorkflowId,
    execution_id: ExecutionId,
}

#[async_trait::async_trait]
impl ResourceProvider for ManagerResourceProvider {
    async fn acquire(&self, resource_id: &str) -> Result<Box<dyn std::any::Any + Send>, ActionError> {
        let scope = nebula_resource::Scope::execution_in_workflow(
            self.execution_id.to_string(),
            self.workflow_id.to_string(),
            None,
        );
        let ctx = nebula_resource::Context::new(
            scope,
            self.workflow_id.to_string(),
            self.execution_id.to_string(),
        );
        let guard = self
            .manager
            .acquire(resource_id, &ctx)
            .await
            .map_err(|e| ActionError::fatal(e.to_string()))?;
        Ok(Box::new(nebula_resource::ResourceHandle::new(guard)))
    }
}

/// Adapts a [`CredentialResolver`] to the action crate's [`CredentialProvider`]
/// port, scoping resolution to the node's configured credential id and the
/// execution's resolving user.
struct EngineCredentialProvider {
    resolver: Arc<dyn CredentialResolver>,
    credential_id: String,
    user_id: String,
}

#[async_trait::async_trait]
impl CredentialProvider for EngineCredentialProvider {
    async fn get(&self, key: &str) -> Result<nebula_action::context::SecureString, ActionError> {
        let secrets = self
            .resolver
            .resolve(&self.credential_id, &self.user_id)
            .await
            .map_err(|e| ActionError::fatal(e.to_string()))?;
        secrets
            .get(key)
            .map(nebula_action::context::SecureString::new)
            .ok_or_else(|| ActionError::fatal(format!("credential has no field '{key}'")))
    }
}

/// How a single [`WorkflowEngine::run_scheduler`] pass ended.
enum SchedulerOutcome {
    Completed,
    Failed(NodeId, String),
    Cancelled,
    Waiting,
}

impl WorkflowEngine {
    /// Create a new engine with the given components.
    pub fn new(
        runtime: Arc<ActionRuntime>,
        event_bus: Arc<EventBus>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            runtime,
            event_bus,
            metrics,
            expression_engine: Arc::new(ExpressionEngine::new()),
            action_keys: HashMap::new(),
            node_registry: NodeRegistry::new(),
            resource_manager: None,
            credential_resolver: None,
            credential_user_id: None,
            env_allowlist: Vec::new(),
            cancel_tokens: Arc::new(DashMap::new()),
        }
    }

    /// Attach a resource manager so actions can acquire pooled resources
    /// through [`ActionContext::resource`](nebula_action::context::ActionContext::resource).
    #[must_use]
    pub fn with_resource_manager(mut self, manager: nebula_resource::Manager) -> Self {
        self.resource_manager = Some(Arc::new(manager));
        self
    }

    /// Attach a credential resolver so nodes whose `credential_id` is set
    /// get a credential provider through
    /// [`ActionContext::credential`](nebula_action::context::ActionContext::credential).
    /// `user_id` is the principal credentials are resolved on behalf of for
    /// every execution this engine runs.
    #[must_use]
    pub fn with_credential_resolver(
        mut self,
        resolver: Arc<dyn CredentialResolver>,
        user_id: impl Into<String>,
    ) -> Self {
        self.credential_resolver = Some(resolver);
        self.credential_user_id = Some(user_id.into());
        self
    }

    /// Allow-list process environment variables for `$env.*` resolution in
    /// node parameters. Variables not named here are invisible to workflow
    /// expressions and resolve to `null`.
    #[must_use]
    pub fn with_env_allowlist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_allowlist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Snapshot the allow-listed environment variables that are actually
    /// set in the process environment right now.
    fn env_snapshot(&self) -> HashMap<String, String> {
        self.env_allowlist
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
            .collect()
    }

    /// Register a mapping from an action ID to a registry key.
    ///
    /// The engine uses this to look up the correct handler in the
    /// runtime's action registry when executing a node.
    pub fn map_action(&mut self, action_id: ActionId, key: impl Into<String>) {
        self.action_keys.insert(action_id, key.into());
    }

    /// Access the node registry.
    pub fn node_registry(&self) -> &NodeRegistry {
        &self.node_registry
    }

    /// Mutable access to the node registry.
    pub fn node_registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.node_registry
    }

    /// Request cancellation of an in-flight execution.
    ///
    /// Returns `true` if `execution_id` was found running under this engine
    /// and its token was signaled, `false` if no such execution is currently
    /// in flight (already finished, or never started here). Signaling is
    /// synchronous from the caller's perspective; the scheduler observes the
    /// token on its next readiness check and in-flight node tasks observe it
    /// at their next cancellation point, so the execution itself may take a
    /// little longer to actually wind down.
    pub fn cancel_execution(&self, execution_id: ExecutionId) -> bool {
        match self.cancel_tokens.get(&execution_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Resolve the action registry key for a given action ID.
    fn resolve_action_key(&self, action_id: ActionId) -> Result<&str, EngineError> {
        self.action_keys
            .get(&action_id)
            .map(String::as_str)
            .ok_or(EngineError::ActionKeyNotFound { action_id })
    }

    /// Execute a workflow from start to finish.
    ///
    /// Entry nodes receive the workflow-level `input`. Subsequent nodes
    /// receive their resolved parameters, or their predecessors' merged
    /// output when the node defines no parameters.
    pub async fn execute_workflow(
        &self,
        workflow: &WorkflowDefinition,
        input: serde_json::Value,
        budget: ExecutionBudget,
    ) -> Result<ExecutionResult, EngineError> {
        let execution_id = ExecutionId::v4();
        let started = Instant::now();

        let graph = DependencyGraph::from_definition(workflow)
            .map_err(|e| EngineError::PlanningFailed(e.to_string()))?;

        for node in &workflow.nodes {
            self.resolve_action_key(node.action_id)?;
        }

        let node_ids: Vec<NodeId> = workflow.nodes.iter().map(|n| n.id).collect();
        let mut exec_state = ExecutionState::new(execution_id, workflow.id, &node_ids);
        exec_state.transition_status(ExecutionStatus::Running)?;

        let cancel_token = CancellationToken::new();
        self.cancel_tokens.insert(execution_id, cancel_token.clone());

        self.event_bus.emit(ExecutionEvent::Started {
            execution_id: execution_id.to_string(),
            workflow_id: workflow.id.to_string(),
        });
        self.metrics.counter("executions_started_total").inc();

        let node_map: HashMap<NodeId, &NodeDefinition> =
            workflow.nodes.iter().map(|n| (n.id, n)).collect();

        let outputs: Arc<DashMap<NodeId, serde_json::Value>> = Arc::new(DashMap::new());
        let semaphore = Arc::new(Semaphore::new(budget.max_concurrent_nodes));
        let node_timeout = Duration::from_millis(
            workflow.config.node_timeout_ms.unwrap_or(DEFAULT_NODE_TIMEOUT_MS),
        );
        let order_index: HashMap<NodeId, usize> = graph
            .topological_order()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        let resolver = ParamResolver::new(self.expression_engine.clone(), self.env_snapshot());

        let outcome = self
            .run_scheduler(
                workflow,
                &graph,
                &node_map,
                &input,
                &outputs,
                &semaphore,
                &cancel_token,
                &mut exec_state,
                execution_id,
                workflow.id,
                &resolver,
                &order_index,
                node_timeout,
                Vec::new(),
            )
            .await;
        self.cancel_tokens.remove(&execution_id);

        let elapsed = started.elapsed();
        let final_status = self.finalize_status(&mut exec_state, &outcome);
        self.emit_final_event(execution_id, final_status, elapsed, &outcome);

        let node_outputs: HashMap<NodeId, serde_json::Value> = outputs
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        let waiting_node_id = exec_state.waiting_node_id;

        Ok(ExecutionResult {
            execution_id,
            status: final_status,
            node_outputs,
            duration: elapsed,
            waiting_node_id,
            exec_state,
        })
    }

    /// Resume a suspended execution.
    ///
    /// `exec_state` must be the [`ExecutionState`] a prior `execute_workflow`
    /// (or `resume_workflow`) call returned via its `waiting_node_id`-bearing
    /// status; callers are expected to have persisted it (through the
    /// archival/persistence layer, or simply held in memory) while waiting
    /// for an approval decision, form submission, or explicit resume.
    ///
    /// If `resume_data` is `Some`, the waiting node completes directly with
    /// that payload as its output, without re-dispatching the action. If
    /// `None`, the node re-enters the scheduler as if newly ready, and its
    /// action runs again — the caller is responsible for only omitting
    /// `resume_data` for actions that are safe to re-enter (idempotent, or
    /// ones whose `Wait` condition the runtime/sandbox resolves on its own).
    ///
    /// The scheduler then resumes exactly where it left off: nodes gated on
    /// the resumed node's output become dispatchable, while any unrelated
    /// in-flight branches (already recorded in `exec_state`) are left alone.
    pub async fn resume_workflow(
        &self,
        workflow: &WorkflowDefinition,
        mut exec_state: ExecutionState,
        resume_data: Option<serde_json::Value>,
        budget: ExecutionBudget,
    ) -> Result<ExecutionResult, EngineError> {
        if exec_state.status != ExecutionStatus::Waiting {
            return Err(EngineError::NotWaiting {
                status: exec_state.status,
            });
        }
        let Some(waiting_node_id) = exec_state.waiting_node_id else {
            return Err(EngineError::NotWaiting {
                status: exec_state.status,
            });
        };

        let execution_id = exec_state.execution_id;
        let workflow_id = exec_state.workflow_id;
        let started = Instant::now();

        let graph = DependencyGraph::from_definition(workflow)
            .map_err(|e| EngineError::PlanningFailed(e.to_string()))?;

        for node in &workflow.nodes {
            self.resolve_action_key(node.action_id)?;
        }

        let cancel_token = CancellationToken::new();
        self.cancel_tokens.insert(execution_id, cancel_token.clone());
        exec_state.transition_status(ExecutionStatus::Running)?;

        self.event_bus.emit(ExecutionEvent::Started {
            execution_id: execution_id.to_string(),
            workflow_id: workflow_id.to_string(),
        });

        let node_map: HashMap<NodeId, &NodeDefinition> =
            workflow.nodes.iter().map(|n| (n.id, n)).collect();

        let outputs: Arc<DashMap<NodeId, serde_json::Value>> = Arc::new(DashMap::new());
        for (id, ns) in &exec_state.node_states {
            if let Some(value) = ns.current_output.as_ref().and_then(|o| o.as_value()) {
                outputs.insert(*id, value.clone());
            }
        }

        let semaphore = Arc::new(Semaphore::new(budget.max_concurrent_nodes));
        let node_timeout = Duration::from_millis(
            workflow.config.node_timeout_ms.unwrap_or(DEFAULT_NODE_TIMEOUT_MS),
        );
        let order_index: HashMap<NodeId, usize> = graph
            .topological_order()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        let resolver = ParamResolver::new(self.expression_engine.clone(), self.env_snapshot());
        let workflow_input = serde_json::Value::Object(exec_state.variables.clone());

        let mut initial_force_ready = Vec::new();
        match resume_data {
            Some(data) => {
                outputs.insert(waiting_node_id, data.clone());
                if let Some(ns) = exec_state.node_states.get_mut(&waiting_node_id) {
                    let _ = ns.transition_to(NodeState::Running);
                    let _ = ns.transition_to(NodeState::Completed);
                    ns.current_output = Some(nebula_execution::NodeOutput::inline(
                        data,
                        NodeState::Completed,
                        0,
                    ));
                }
            }
            None => {
                let node_input =
                    resolve_node_input(waiting_node_id, &graph, &outputs, &workflow_input);
                initial_force_ready.push((waiting_node_id, node_input));
            }
        }

        let outcome = self
            .run_scheduler(
                workflow,
                &graph,
                &node_map,
                &workflow_input,
                &outputs,
                &semaphore,
                &cancel_token,
                &mut exec_state,
                execution_id,
                workflow_id,
                &resolver,
                &order_index,
                node_timeout,
                initial_force_ready,
            )
            .await;
        self.cancel_tokens.remove(&execution_id);

        let elapsed = started.elapsed();
        let final_status = self.finalize_status(&mut exec_state, &outcome);
        self.emit_final_event(execution_id, final_status, elapsed, &outcome);

        let node_outputs: HashMap<NodeId, serde_json::Value> = outputs
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        let waiting_node_id = exec_state.waiting_node_id;

        Ok(ExecutionResult {
            execution_id,
            status: final_status,
            node_outputs,
            duration: elapsed,
            waiting_node_id,
            exec_state,
        })
    }

    /// Drive the readiness loop until no node is ready, in flight, or the
    /// execution suspends, fails uncaught, or is cancelled.
    #[allow(clippy::too_many_arguments)]
    async fn run_scheduler(
        &self,
        workflow: &WorkflowDefinition,
        graph: &DependencyGraph,
        node_map: &HashMap<NodeId, &NodeDefinition>,
        workflow_input: &serde_json::Value,
        outputs: &Arc<DashMap<NodeId, serde_json::Value>>,
        semaphore: &Arc<Semaphore>,
        cancel_token: &CancellationToken,
        exec_state: &mut ExecutionState,
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        resolver: &ParamResolver,
        order_index: &HashMap<NodeId, usize>,
        node_timeout: Duration,
        initial_force_ready: Vec<(NodeId, serde_json::Value)>,
    ) -> SchedulerOutcome {
        let mut join_set: JoinSet<(NodeId, Result<ActionResult<serde_json::Value>, EngineError>)> =
            JoinSet::new();
        let mut uncaught_failure: Option<(NodeId, String)> = None;
        let mut triggered_error_nodes: HashSet<NodeId> = HashSet::new();
        let mut force_ready: Vec<(NodeId, serde_json::Value)> = initial_force_ready;

        loop {
            let to_dispatch = if cancel_token.is_cancelled() {
                Vec::new()
            } else {
                let (ready, skipped) =
                    compute_frontier(graph, node_map, exec_state, &mut force_ready, workflow_input, outputs);
                for node_id in skipped {
                    if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                        let _ = ns.transition_to(NodeState::Skipped);
                    }
                }
                let mut ready = ready;
                ready.sort_by_key(|(id, _)| order_index.get(id).copied().unwrap_or(usize::MAX));
                ready
            };

            for (node_id, node_input) in to_dispatch {
                let Some(node_def) = node_map.get(&node_id).copied() else {
                    continue;
                };
                let Ok(action_key) = self.resolve_action_key(node_def.action_id) else {
                    continue;
                };
                let action_key = action_key.to_owned();

                let resolved = resolver.resolve(
                    node_id,
                    &node_def.params,
                    &node_input,
                    workflow_input,
                    outputs,
                );
                let effective_input = match resolved {
                    Ok(Some(v)) => v,
                    Ok(None) => node_input,
                    Err(err) => {
                        let caught = record_node_failure(
                            exec_state,
                            workflow,
                            node_id,
                            &err,
                            &mut triggered_error_nodes,
                            &mut force_ready,
                        );
                        if !caught {
                            uncaught_failure.get_or_insert((node_id, err.to_string()));
                            cancel_token.cancel();
                        }
                        continue;
                    }
                };

                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Ready);
                    let _ = ns.transition_to(NodeState::Running);
                }

                let runtime = self.runtime.clone();
                let cancel = cancel_token.clone();
                let sem = semaphore.clone();
                let outputs_ref = outputs.clone();
                let resources: Option<Arc<dyn ResourceProvider>> =
                    self.resource_manager.clone().map(|manager| {
                        Arc::new(ManagerResourceProvider {
                            manager,
                            workflow_id,
                            execution_id,
                        }) as Arc<dyn ResourceProvider>
                    });
                let credentials: Option<Arc<dyn CredentialProvider>> =
                    match (&self.credential_resolver, &self.credential_user_id, &node_def.credential_id) {
                        (Some(resolver), Some(user_id), Some(credential_id)) => {
                            Some(Arc::new(EngineCredentialProvider {
                                resolver: resolver.clone(),
                                credential_id: credential_id.clone(),
                                user_id: user_id.clone(),
                            }) as Arc<dyn CredentialProvider>)
                        }
                        _ => None,
                    };

                join_set.spawn(
                    NodeTask {
                        runtime,
                        cancel,
                        sem,
                        outputs: outputs_ref,
                        execution_id,
                        node_id,
                        workflow_id,
                        action_key,
                        input: effective_input,
                        timeout: node_timeout,
                        resources,
                        credentials,
                    }
                    .run(),
                );
            }

            let Some(join_result) = join_set.join_next().await else {
                break;
            };

            match join_result {
                Ok((node_id, Ok(action_result))) => {
                    self.apply_success(exec_state, execution_id, node_id, &action_result);
                }
                Ok((node_id, Err(err))) => {
                    if matches!(err, EngineError::Cancelled) {
                        if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                            let _ = ns.transition_to(NodeState::Cancelled);
                        }
                        continue;
                    }
                    let caught = record_node_failure(
                        exec_state,
                        workflow,
                        node_id,
                        &err,
                        &mut triggered_error_nodes,
                        &mut force_ready,
                    );
                    if !caught {
                        uncaught_failure.get_or_insert((node_id, err.to_string()));
                        cancel_token.cancel();
                    }
                }
                Err(join_err) => {
                    tracing::error!(?join_err, "node task panicked");
                    cancel_token.cancel();
                    uncaught_failure.get_or_insert((NodeId::v4(), join_err.to_string()));
                }
            }
        }

        if let Some((node_id, msg)) = uncaught_failure {
            SchedulerOutcome::Failed(node_id, msg)
        } else if cancel_token.is_cancelled() {
            SchedulerOutcome::Cancelled
        } else if exec_state.status == ExecutionStatus::Waiting {
            SchedulerOutcome::Waiting
        } else {
            SchedulerOutcome::Completed
        }
    }

    /// Apply a successfully-returned [`ActionResult`] to the execution
    /// state: record branch decisions, suspend on `Wait`, skip on `Skip`,
    /// complete otherwise. The primary output was already recorded by the
    /// task itself.
    fn apply_success(
        &self,
        exec_state: &mut ExecutionState,
        execution_id: ExecutionId,
        node_id: NodeId,
        result: &ActionResult<serde_json::Value>,
    ) {
        match result {
            ActionResult::Branch { selected, .. } => {
                exec_state
                    .branch_decisions
                    .insert(node_id, vec![selected.clone()]);
                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Completed);
                }
            }
            ActionResult::MultiOutput { outputs, .. } => {
                exec_state
                    .branch_decisions
                    .insert(node_id, outputs.keys().cloned().collect());
                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Completed);
                }
            }
            ActionResult::Skip { .. } => {
                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Skipped);
                }
            }
            ActionResult::Wait { condition, .. } => {
                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Waiting);
                }
                let _ = exec_state.transition_to_waiting(node_id);
                self.event_bus.emit(ExecutionEvent::Waiting {
                    execution_id: execution_id.to_string(),
                    node_id: node_id.to_string(),
                    reason: wait_reason(condition).to_owned(),
                });
            }
            _ => {
                if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Completed);
                }
            }
        }
    }

    /// Finalize the execution status, sweeping leftover pending nodes and
    /// driving `ExecutionState` through the required transition path.
    fn finalize_status(
        &self,
        exec_state: &mut ExecutionState,
        outcome: &SchedulerOutcome,
    ) -> ExecutionStatus {
        let target = match outcome {
            SchedulerOutcome::Failed(..) => ExecutionStatus::Failed,
            SchedulerOutcome::Cancelled => ExecutionStatus::Cancelled,
            SchedulerOutcome::Waiting => ExecutionStatus::Waiting,
            SchedulerOutcome::Completed => ExecutionStatus::Completed,
        };

        if exec_state.status != target {
            if target == ExecutionStatus::Cancelled && exec_state.status != ExecutionStatus::Cancelling
            {
                let _ = exec_state.transition_status(ExecutionStatus::Cancelling);
            }
            let _ = exec_state.transition_status(target);
        }

        if target != ExecutionStatus::Waiting {
            let sweep_to = if target == ExecutionStatus::Cancelled {
                NodeState::Cancelled
            } else {
                NodeState::Skipped
            };
            for ns in exec_state.node_states.values_mut() {
                if ns.state == NodeState::Pending {
                    let _ = ns.transition_to(sweep_to);
                }
            }
        }

        target
    }

    /// Emit the final execution event and record metrics.
    fn emit_final_event(
        &self,
        execution_id: ExecutionId,
        status: ExecutionStatus,
        elapsed: Duration,
        outcome: &SchedulerOutcome,
    ) {
        match status {
            ExecutionStatus::Completed => {
                self.event_bus.emit(ExecutionEvent::Completed {
                    execution_id: execution_id.to_string(),
                    duration: elapsed,
                });
                self.metrics.counter("executions_completed_total").inc();
            }
            ExecutionStatus::Failed => {
                let error_msg = match outcome {
                    SchedulerOutcome::Failed(_, e) => e.clone(),
                    _ => String::new(),
                };
                self.event_bus.emit(ExecutionEvent::Failed {
                    execution_id: execution_id.to_string(),
                    error: error_msg,
                });
                self.metrics.counter("executions_failed_total").inc();
            }
            ExecutionStatus::Cancelled => {
                self.event_bus.emit(ExecutionEvent::Cancelled {
                    execution_id: execution_id.to_string(),
                });
            }
            _ => {}
        }

        self.metrics
            .histogram("execution_duration_seconds")
            .observe(elapsed.as_secs_f64());
    }
}

/// Bundled parameters for a single node execution task.
struct NodeTask {
    runtime: Arc<ActionRuntime>,
    cancel: CancellationToken,
    sem: Arc<Semaphore>,
    outputs: Arc<DashMap<NodeId, serde_json::Value>>,
    execution_id: ExecutionId,
    node_id: NodeId,
    workflow_id: WorkflowId,
    action_key: String,
    input: serde_json::Value,
    timeout: Duration,
    resources: Option<Arc<dyn ResourceProvider>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl NodeTask {
    /// Execute this node: acquire semaphore, check cancellation, run action
    /// under a soft timeout.
    async fn run(self) -> (NodeId, Result<ActionResult<serde_json::Value>, EngineError>) {
        let _permit = self.sem.acquire().await.expect("semaphore closed");

        if self.cancel.is_cancelled() {
            return (self.node_id, Err(EngineError::Cancelled));
        }

        let mut action_ctx = ActionContext::new(
            self.execution_id,
            self.node_id,
            self.workflow_id,
            ScopeLevel::Global,
        )
        .with_cancellation(self.cancel.child_token());
        if let Some(resources) = self.resources.clone() {
            action_ctx = action_ctx.with_resources(resources);
        }
        if let Some(credentials) = self.credentials.clone() {
            action_ctx = action_ctx.with_credentials(credentials);
        }

        let node_id = self.node_id;
        let fut = self
            .runtime
            .execute_action(&self.action_key, self.input, action_ctx);

        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(EngineError::Runtime),
            Err(_elapsed) => Err(EngineError::NodeFailed {
                node_id,
                error: "TIMEOUT".to_owned(),
            }),
        };

        if let Ok(action_result) = &result {
            if let Some(output) = extract_primary_output(action_result) {
                self.outputs.insert(node_id, output);
            }
        }

        (node_id, result)
    }
}

/// Compute the set of nodes ready to dispatch this round and the set that
/// must be marked skipped because a predecessor's branch choice (or own
/// skip/failure) will never activate the edge leading to them.
///
/// Error-trigger nodes are excluded from ordinary readiness: they only
/// ever dispatch through `force_ready`, which this call drains.
fn compute_frontier(
    graph: &DependencyGraph,
    node_map: &HashMap<NodeId, &NodeDefinition>,
    exec_state: &ExecutionState,
    force_ready: &mut Vec<(NodeId, serde_json::Value)>,
    workflow_input: &serde_json::Value,
    outputs: &DashMap<NodeId, serde_json::Value>,
) -> (Vec<(NodeId, serde_json::Value)>, Vec<NodeId>) {
    let mut ready = Vec::new();
    let mut skipped = Vec::new();

    for (&node_id, node_def) in node_map {
        if node_def.is_error_trigger() {
            continue;
        }
        let Some(ns) = exec_state.node_state(node_id) else {
            continue;
        };
        if ns.state != NodeState::Pending {
            continue;
        }

        let predecessors = graph.predecessors(node_id);
        if predecessors.is_empty() {
            ready.push((node_id, workflow_input.clone()));
            continue;
        }

        let mut all_terminal = true;
        let mut all_activate = true;
        for &pred in predecessors {
            let Some(pred_ns) = exec_state.node_state(pred) else {
                continue;
            };
            if !pred_ns.state.is_terminal() {
                all_terminal = false;
                break;
            }
            if pred_ns.state != NodeState::Completed {
                all_activate = false;
                continue;
            }
            if let Some(selected) = exec_state.branch_decisions.get(&pred) {
                let activates = edge_activates(graph, pred, node_id, selected);
                if !activates {
                    all_activate = false;
                }
            }
        }

        if !all_terminal {
            continue;
        }
        if all_activate {
            let node_input = resolve_node_input(node_id, graph, outputs, workflow_input);
            ready.push((node_id, node_input));
        } else {
            skipped.push(node_id);
        }
    }

    for (node_id, payload) in force_ready.drain(..) {
        ready.push((node_id, payload));
    }

    (ready, skipped)
}

/// Whether a connection from a branching `pred` to `node_id` is on a
/// selected handle (connections with no handle are not branch-gated).
fn edge_activates(graph: &DependencyGraph, pred: NodeId, node_id: NodeId, selected: &[String]) -> bool {
    graph
        .outgoing(pred)
        .iter()
        .filter(|c: &&Connection| c.to == node_id)
        .any(|c| match &c.source_handle {
            Some(handle) => selected.iter().any(|s| s == handle),
            None => true,
        })
}

/// Record a node failure in execution state, then look for an error
/// trigger whose `error_types` matches this failure's category. Returns
/// `true` if at least one matching trigger was queued to re-enter as a
/// fresh sub-pipeline root.
fn record_node_failure(
    exec_state: &mut ExecutionState,
    workflow: &WorkflowDefinition,
    node_id: NodeId,
    err: &EngineError,
    triggered: &mut HashSet<NodeId>,
    force_ready: &mut Vec<(NodeId, serde_json::Value)>,
) -> bool {
    if let Some(ns) = exec_state.node_states.get_mut(&node_id) {
        let _ = ns.transition_to(NodeState::Failed);
        ns.error_message = Some(err.to_string());
    }

    let error_type = classify_error(err);
    let mut caught = false;
    for node_def in &workflow.nodes {
        if !node_def.is_error_trigger() || !node_def.error_types.contains(error_type) {
            continue;
        }
        if triggered.contains(&node_def.id) {
            continue;
        }
        let is_pending = exec_state
            .node_state(node_def.id)
            .map(|ns| ns.state == NodeState::Pending)
            .unwrap_or(false);
        if !is_pending {
            continue;
        }

        triggered.insert(node_def.id);
        let payload = serde_json::json!({
            "error": err.to_string(),
            "node_id": node_id.to_string(),
            "error_type": error_type,
        });
        force_ready.push((node_def.id, payload));
        caught = true;
    }
    caught
}

/// Categorize an engine error into the coarse error-type vocabulary that
/// `NodeDefinition::error_types` matches against.
fn classify_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::NodeFailed { error, .. } if error == "TIMEOUT" => "TIMEOUT",
        EngineError::ParameterResolution { .. } => "PARAMETER_RESOLUTION",
        _ => "NODE_EXECUTION_FAILURE",
    }
}

/// Map a suspend condition to the short reason string carried on
/// `ExecutionEvent::Waiting`.
fn wait_reason(condition: &WaitCondition) -> &'static str {
    match condition {
        WaitCondition::Webhook { .. } => "webhook",
        WaitCondition::Until { .. } | WaitCondition::Duration { .. } => "wait",
        WaitCondition::Approval { .. } => "approval",
        WaitCondition::Form { .. } => "form",
        WaitCondition::Execution { .. } => "execution",
    }
}

/// Resolve the input for a node from its predecessors' outputs.
///
/// - Entry nodes (no predecessors): receive the workflow-level input.
/// - Single predecessor: receive that node's output directly.
/// - Multiple predecessors: receive a JSON object with each predecessor's
///   output keyed by its node ID.
fn resolve_node_input(
    node_id: NodeId,
    graph: &DependencyGraph,
    outputs: &DashMap<NodeId, serde_json::Value>,
    workflow_input: &serde_json::Value,
) -> serde_json::Value {
    let predecessors = graph.predecessors(node_id);
    if predecessors.is_empty() {
        return workflow_input.clone();
    }
    if predecessors.len() == 1 {
        return outputs
            .get(&predecessors[0])
            .map(|v| v.value().clone())
            .unwrap_or(serde_json::Value::Null);
    }
    let mut merged = serde_json::Map::new();
    for pred_id in predecessors {
        if let Some(output) = outputs.get(pred_id) {
            merged.insert(pred_id.to_string(), output.value().clone());
        }
    }
    serde_json::Value::Object(merged)
}

/// Extract the primary output value from an ActionResult for downstream
/// input resolution.
fn extract_primary_output(result: &ActionResult<serde_json::Value>) -> Option<serde_json::Value> {
    match result {
        ActionResult::Success { output } => Some(output.clone()),
        ActionResult::Skip { output, .. } => output.clone(),
        ActionResult::Continue { output, .. } => Some(output.clone()),
        ActionResult::Break { output, .. } => Some(output.clone()),
        ActionResult::Branch { output, .. } => Some(output.clone()),
        ActionResult::Route { data, .. } => Some(data.clone()),
        ActionResult::MultiOutput { main_output, .. } => main_output.clone(),
        ActionResult::Wait { partial_output, .. } => partial_output.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_action::ActionError;
    use nebula_action::ParameterCollection;
    use nebula_action::capability::IsolationLevel;
    use nebula_action::handler::InternalHandler;
    use nebula_action::metadata::{ActionMetadata, ActionType};
    use nebula_action::result::ActionResult;
    use nebula_core::Version;
    use nebula_core::id::ActionId;
    use nebula_runtime::DataPassingPolicy;
    use nebula_runtime::registry::ActionRegistry;
    use nebula_sandbox_inprocess::{ActionExecutor, InProcessSandbox};
    use nebula_workflow::{Connection, NodeDefinition, WorkflowConfig, WorkflowDefinition};

    // -- Test handlers --

    struct EchoHandler {
        meta: ActionMetadata,
    }

    #[async_trait::async_trait]
    impl InternalHandler for EchoHandler {
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

    /// Reads the `"apiKey"` credential field and returns it as output.
    struct CredentialEchoHandler {
        meta: ActionMetadata,
    }

    #[async_trait::async_trait]
    impl InternalHandler for CredentialEchoHandler {
        async fn execute(
            &self,
            _input: serde_json::Value,
            ctx: ActionContext,
        ) -> Result<ActionResult<serde_json::Value>, ActionError> {
            let secret = ctx.credential("apiKey").await?;
            Ok(ActionResult::success(serde_json::json!(secret.expose())))
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

    struct FailHandler {
        meta: ActionMetadata,
    }

    #[async_trait::async_trait]
    impl InternalHandler for FailHandler {
        async fn execute(
            &self,
            _input: serde_json::Value,
            _ctx: ActionContext,
        ) -> Result<ActionResult<serde_json::Value>, ActionError> {
            Err(ActionError::fatal("intentional failure"))
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

    /// Returns `ActionResult::Branch` choosing the handle named by its input string.
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
            let selected = input.as_str().unwrap_or("default").to_owned();
            Ok(ActionResult::Branch {
                selected,
                output: input.clone(),
                alternatives: HashMap::new(),
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

    /// Emits on both `"portA"` and `"portB"`, leaving a third, unreferenced
    /// port out of its `outputs` map.
    struct MultiOutputHandler {
        meta: ActionMetadata,
    }

    #[async_trait::async_trait]
    impl InternalHandler for MultiOutputHandler {
        async fn execute(
            &self,
            input: serde_json::Value,
            _ctx: ActionContext,
        ) -> Result<ActionResult<serde_json::Value>, ActionError> {
            let mut outputs = HashMap::new();
            outputs.insert("portA".to_string(), input.clone());
            outputs.insert("portB".to_string(), input.clone());
            Ok(ActionResult::MultiOutput {
                outputs,
                main_output: Some(input),
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

    /// Reports the execution id it was invoked with, then sleeps long enough
    /// for a test to race a cancellation against it.
    struct SleepAndSignalHandler {
        meta: ActionMetadata,
        started_tx: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<ExecutionId>>>,
    }

    #[async_trait::async_trait]
    impl InternalHandler for SleepAndSignalHandler {
        async fn execute(
            &self,
            input: serde_json::Value,
            ctx: ActionContext,
        ) -> Result<ActionResult<serde_json::Value>, ActionError> {
            if let Some(tx) = self.started_tx.lock().unwrap().take() {
                let _ = tx.send(ctx.execution_id);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
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

    /// Always suspends on an approval gate.
    struct ApprovalWaitHandler {
        meta: ActionMetadata,
    }

    #[async_trait::async_trait]
    impl InternalHandler for ApprovalWaitHandler {
        async fn execute(
            &self,
            input: serde_json::Value,
            _ctx: ActionContext,
        ) -> Result<ActionResult<serde_json::Value>, ActionError> {
            Ok(ActionResult::Wait {
                condition: WaitCondition::Approval {
                    approval_id: "appr-1".to_owned(),
                    message: "please approve".to_owned(),
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

    // -- Helpers --

    fn make_workflow(
        nodes: Vec<NodeDefinition>,
        connections: Vec<Connection>,
    ) -> WorkflowDefinition {
        let now = chrono::Utc::now();
        WorkflowDefinition {
            id: WorkflowId::v4(),
            name: "test".into(),
            description: None,
            version: Version::new(0, 1, 0),
            nodes,
            connections,
            variables: HashMap::new(),
            config: WorkflowConfig::default(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_engine(
        registry: Arc<ActionRegistry>,
    ) -> (WorkflowEngine, Arc<EventBus>, Arc<MetricsRegistry>) {
        let executor: ActionExecutor = Arc::new(|_ctx, _meta, input| {
            Box::pin(async move { Ok(ActionResult::success(input)) })
        });
        let sandbox = Arc::new(InProcessSandbox::new(executor));
        let event_bus = Arc::new(EventBus::new(64));
        let metrics = Arc::new(MetricsRegistry::new());

        let runtime = Arc::new(ActionRuntime::new(
            registry,
            sandbox,
            DataPassingPolicy::default(),
            event_bus.clone(),
            metrics.clone(),
        ));

        let engine = WorkflowEngine::new(runtime, event_bus.clone(), metrics.clone());
        (engine, event_bus, metrics)
    }

    // -- Tests --

    #[tokio::test]
    async fn single_node_workflow() {
        let action_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(action_id, "echo");

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "echo", action_id)], vec![]);

        let result = engine
            .execute_workflow(&wf, serde_json::json!("hello"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.node_output(n), Some(&serde_json::json!("hello")));
    }

    #[tokio::test]
    async fn env_allowlist_resolves_node_parameters() {
        let action_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(action_id, "echo");
        let engine = engine.with_env_allowlist(["NEBULA_TEST_ENGINE_ENV_VAR"]);

        std::env::set_var("NEBULA_TEST_ENGINE_ENV_VAR", "snapshot-value");

        let n = NodeId::v4();
        let mut params = HashMap::new();
        params.insert(
            "stage".to_owned(),
            nebula_workflow::ParamValue::expression("$env.NEBULA_TEST_ENGINE_ENV_VAR"),
        );
        let wf = make_workflow(
            vec![NodeDefinition::new(n, "echo", action_id).with_params(params)],
            vec![],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await
            .unwrap();

        std::env::remove_var("NEBULA_TEST_ENGINE_ENV_VAR");

        assert!(result.is_success());
        assert_eq!(
            result.node_output(n),
            Some(&serde_json::json!({"stage": "snapshot-value"}))
        );
    }

    #[tokio::test]
    async fn credential_resolver_supplies_node_credential() {
        let action_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(CredentialEchoHandler {
            meta: ActionMetadata::new("cred-echo", "Credential Echo", "echoes the apiKey credential")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(action_id, "cred-echo");

        let resolver = Arc::new(nebula_credential::InMemoryCredentialResolver::new());
        let mut secrets = HashMap::new();
        secrets.insert("apiKey".to_owned(), "sk-live-abc".to_owned());
        resolver.insert("cred-1", "user-42", secrets);
        let engine = engine.with_credential_resolver(resolver, "user-42");

        let n = NodeId::v4();
        let wf = make_workflow(
            vec![NodeDefinition::new(n, "cred-echo", action_id).with_credential_id("cred-1")],
            vec![],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.node_output(n), Some(&serde_json::json!("sk-live-abc")));
    }

    #[tokio::test]
    async fn node_without_credential_id_gets_no_provider() {
        let action_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(CredentialEchoHandler {
            meta: ActionMetadata::new("cred-echo", "Credential Echo", "echoes the apiKey credential")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(action_id, "cred-echo");

        let resolver = Arc::new(nebula_credential::InMemoryCredentialResolver::new());
        let engine = engine.with_credential_resolver(resolver, "user-42");

        // No `credential_id` on this node, so no provider is attached even
        // though the engine has a resolver configured.
        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "cred-echo", action_id)], vec![]);

        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn linear_two_node_workflow() {
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(echo_id, "echo");

        let n1 = NodeId::v4();
        let n2 = NodeId::v4();
        let wf = make_workflow(
            vec![
                NodeDefinition::new(n1, "A", echo_id),
                NodeDefinition::new(n2, "B", echo_id),
            ],
            vec![Connection::new(n1, n2)],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!(42), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.node_output(n1), Some(&serde_json::json!(42)));
        // B echoes its input, which is A's output (42)
        assert_eq!(result.node_output(n2), Some(&serde_json::json!(42)));
    }

    #[tokio::test]
    async fn diamond_workflow() {
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(echo_id, "echo");

        let a = NodeId::v4();
        let b = NodeId::v4();
        let c = NodeId::v4();
        let d = NodeId::v4();
        let wf = make_workflow(
            vec![
                NodeDefinition::new(a, "A", echo_id),
                NodeDefinition::new(b, "B", echo_id),
                NodeDefinition::new(c, "C", echo_id),
                NodeDefinition::new(d, "D", echo_id),
            ],
            vec![
                Connection::new(a, b),
                Connection::new(a, c),
                Connection::new(b, d),
                Connection::new(c, d),
            ],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!("start"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.node_outputs.len(), 4);
        assert_eq!(result.node_output(a), Some(&serde_json::json!("start")));
        assert_eq!(result.node_output(b), Some(&serde_json::json!("start")));
        assert_eq!(result.node_output(c), Some(&serde_json::json!("start")));
        // Join node gets merged outputs from b and c
        let d_output = result.node_output(d).unwrap();
        assert!(d_output.is_object());
    }

    #[tokio::test]
    async fn failing_node_stops_execution() {
        let echo_id = ActionId::v4();
        let fail_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));
        registry.register(Arc::new(FailHandler {
            meta: ActionMetadata::new("fail", "Fail", "always fails")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(echo_id, "echo");
        engine.map_action(fail_id, "fail");

        let n1 = NodeId::v4();
        let n2 = NodeId::v4();
        let n3 = NodeId::v4();
        let wf = make_workflow(
            vec![
                NodeDefinition::new(n1, "A", echo_id),
                NodeDefinition::new(n2, "B", fail_id),
                NodeDefinition::new(n3, "C", echo_id),
            ],
            vec![Connection::new(n1, n2), Connection::new(n2, n3)],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!("input"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_failure());
        assert!(result.node_output(n1).is_some());
        assert!(result.node_output(n2).is_none());
        assert!(result.node_output(n3).is_none());
    }

    #[tokio::test]
    async fn missing_action_key_returns_error() {
        let unknown_action = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        let (engine, _, _) = make_engine(registry);

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "A", unknown_action)], vec![]);

        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await;

        assert!(matches!(result, Err(EngineError::ActionKeyNotFound { .. })));
    }

    #[tokio::test]
    async fn empty_workflow_returns_planning_error() {
        let registry = Arc::new(ActionRegistry::new());
        let (engine, _, _) = make_engine(registry);

        let wf = make_workflow(vec![], vec![]);
        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await;

        assert!(matches!(result, Err(EngineError::PlanningFailed(_))));
    }

    #[tokio::test]
    async fn telemetry_events_emitted() {
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, event_bus, metrics) = make_engine(registry);
        engine.map_action(echo_id, "echo");

        let mut sub = event_bus.subscribe();

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "echo", echo_id)], vec![]);

        engine
            .execute_workflow(&wf, serde_json::json!("test"), ExecutionBudget::default())
            .await
            .unwrap();

        // Should have events from both engine (Started, Completed) and runtime
        let mut event_count = 0;
        while sub.try_recv().is_some() {
            event_count += 1;
        }
        assert!(event_count >= 3);

        assert!(metrics.counter("executions_started_total").get() > 0);
        assert!(metrics.counter("executions_completed_total").get() > 0);
    }

    #[tokio::test]
    async fn metrics_recorded_on_failure() {
        let fail_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(FailHandler {
            meta: ActionMetadata::new("fail", "Fail", "always fails")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, metrics) = make_engine(registry);
        engine.map_action(fail_id, "fail");

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "fail", fail_id)], vec![]);

        let result = engine
            .execute_workflow(&wf, serde_json::json!(null), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_failure());
        assert!(metrics.counter("executions_started_total").get() > 0);
        assert!(metrics.counter("executions_failed_total").get() > 0);
    }

    #[tokio::test]
    async fn branch_skips_unselected_downstream() {
        let switch_id = ActionId::v4();
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(SwitchHandler {
            meta: ActionMetadata::new("switch", "Switch", "branches on input")
                .with_isolation(IsolationLevel::None),
        }));
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(switch_id, "switch");
        engine.map_action(echo_id, "echo");

        let s = NodeId::v4();
        let case_foo = NodeId::v4();
        let case_bar = NodeId::v4();
        let wf = make_workflow(
            vec![
                NodeDefinition::new(s, "Switch", switch_id),
                NodeDefinition::new(case_foo, "CaseFoo", echo_id),
                NodeDefinition::new(case_bar, "CaseBar", echo_id),
            ],
            vec![
                Connection::from_handle(s, "caseFoo", case_foo),
                Connection::from_handle(s, "caseBar", case_bar),
            ],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!("caseFoo"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.node_output(case_foo).is_some());
        assert!(result.node_output(case_bar).is_none());
    }

    #[tokio::test]
    async fn multi_output_gates_downstream_on_selected_ports() {
        let multi_id = ActionId::v4();
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(MultiOutputHandler {
            meta: ActionMetadata::new("multi", "Multi", "emits on multiple ports")
                .with_isolation(IsolationLevel::None),
        }));
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(multi_id, "multi");
        engine.map_action(echo_id, "echo");

        let m = NodeId::v4();
        let on_a = NodeId::v4();
        let on_b = NodeId::v4();
        let on_c = NodeId::v4();
        let wf = make_workflow(
            vec![
                NodeDefinition::new(m, "Multi", multi_id),
                NodeDefinition::new(on_a, "OnA", echo_id),
                NodeDefinition::new(on_b, "OnB", echo_id),
                NodeDefinition::new(on_c, "OnC", echo_id),
            ],
            vec![
                Connection::from_handle(m, "portA", on_a),
                Connection::from_handle(m, "portB", on_b),
                // portC was never emitted; this edge must not activate.
                Connection::from_handle(m, "portC", on_c),
            ],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!("payload"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.node_output(on_a).is_some());
        assert!(result.node_output(on_b).is_some());
        assert!(result.node_output(on_c).is_none());
    }

    #[tokio::test]
    async fn wait_result_suspends_execution() {
        let wait_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(ApprovalWaitHandler {
            meta: ActionMetadata::new("wait", "Wait", "suspends on approval")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(wait_id, "wait");

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "Gate", wait_id)], vec![]);

        let result = engine
            .execute_workflow(&wf, serde_json::json!("payload"), ExecutionBudget::default())
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Waiting);
        assert_eq!(result.waiting_node_id, Some(n));
        assert_eq!(result.node_output(n), Some(&serde_json::json!("payload")));
    }

    #[tokio::test]
    async fn error_trigger_catches_failure_and_execution_completes() {
        let fail_id = ActionId::v4();
        let echo_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        registry.register(Arc::new(FailHandler {
            meta: ActionMetadata::new("fail", "Fail", "always fails")
                .with_isolation(IsolationLevel::None),
        }));
        registry.register(Arc::new(EchoHandler {
            meta: ActionMetadata::new("echo", "Echo", "echoes input")
                .with_isolation(IsolationLevel::None),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(fail_id, "fail");
        engine.map_action(echo_id, "echo");

        let failing = NodeId::v4();
        let handler = NodeId::v4();
        let mut error_types = HashSet::new();
        error_types.insert("NODE_EXECUTION_FAILURE".to_owned());
        let wf = make_workflow(
            vec![
                NodeDefinition::new(failing, "Failing", fail_id),
                NodeDefinition::new(handler, "ErrorHandler", echo_id)
                    .with_error_types(error_types),
            ],
            vec![],
        );

        let result = engine
            .execute_workflow(&wf, serde_json::json!("input"), ExecutionBudget::default())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.node_output(failing).is_none());
        assert!(result.node_output(handler).is_some());
    }

    #[tokio::test]
    async fn cancel_execution_unknown_id_returns_false() {
        let registry = Arc::new(ActionRegistry::new());
        let (engine, _, _) = make_engine(registry);
        assert!(!engine.cancel_execution(ExecutionId::v4()));
    }

    #[tokio::test]
    async fn cancel_execution_signals_in_flight_run() {
        let sleep_id = ActionId::v4();
        let registry = Arc::new(ActionRegistry::new());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        registry.register(Arc::new(SleepAndSignalHandler {
            meta: ActionMetadata::new("sleep", "Sleep", "sleeps then completes")
                .with_isolation(IsolationLevel::None),
            started_tx: std::sync::Mutex::new(Some(started_tx)),
        }));

        let (mut engine, _, _) = make_engine(registry);
        engine.map_action(sleep_id, "sleep");
        let engine = Arc::new(engine);

        let n = NodeId::v4();
        let wf = make_workflow(vec![NodeDefinition::new(n, "Sleep", sleep_id)], vec![]);

        let run_engine = engine.clone();
        let handle = tokio::spawn(async move {
            run_engine
                .execute_workflow(&wf, serde_json::json!("payload"), ExecutionBudget::default())
                .await
                .unwrap()
        });

        let execution_id = started_rx.await.unwrap();
        assert!(engine.cancel_execution(execution_id));
        // Once this run's token is removed, cancelling again finds nothing.
        let result = handle.await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Cancelled);
        assert!(!engine.cancel_execution(execution_id));
    }
}
