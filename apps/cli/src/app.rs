//! Composition root: wires the file-backed repositories, coordinators, and
//! engine components every subcommand needs from a loaded [`Config`].

use std::sync::Arc;

use nebula_action::context::ActionContext;
use nebula_action::ExecutionBudget;
use nebula_approval::ApprovalCoordinator;
use nebula_archive::{ArchiveService, NoWorkflowLookup};
use nebula_engine::WorkflowEngine;
use nebula_form::{FormCoordinator, ResumeSignal};
use nebula_persistence::{
    FileApprovalRepository, FileArchiveRepository, FileExecutionRepository,
    FileFormTriggerRepository,
};
use nebula_runtime::data_policy::DataPassingPolicy;
use nebula_runtime::ActionRuntime;
use nebula_sandbox_inprocess::InProcessSandbox;
use nebula_telemetry::event::EventBus;
use nebula_telemetry::metrics::MetricsRegistry;
use nebula_workflow::WorkflowDefinition;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::handlers;
use crate::workflow_io;

/// Event bus capacity for the CLI's in-process bus.
///
/// Nothing long-lived subscribes across invocations (the process exits after
/// each subcommand), so this only needs to absorb one execution's worth of
/// events.
const EVENT_BUS_CAPACITY: usize = 1024;

/// Everything a subcommand needs to talk to the durable (file-backed) state
/// and to build an engine for a specific workflow.
pub struct AppContext {
    pub config: Config,
    pub executions: Arc<FileExecutionRepository>,
    pub approvals: Arc<FileApprovalRepository>,
    pub forms: Arc<FileFormTriggerRepository>,
    pub archives: Arc<FileArchiveRepository>,
    pub event_bus: Arc<EventBus>,
    pub metrics: Arc<MetricsRegistry>,
    pub approval_coordinator: Arc<ApprovalCoordinator>,
    pub form_coordinator: Arc<FormCoordinator>,
    /// Receiving half of the form coordinator's resume channel. A one-shot
    /// CLI invocation has no long-running scheduler to hand this to; it is
    /// kept here so a future `nebula serve`-style long-lived mode has
    /// somewhere to take it from, and so the channel itself stays open.
    pub form_resume_rx: mpsc::UnboundedReceiver<ResumeSignal>,
}

impl AppContext {
    /// Build the composition root from a resolved [`Config`].
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let executions = Arc::new(FileExecutionRepository::open(&config.data_dir));
        let approvals = Arc::new(FileApprovalRepository::open(&config.data_dir));
        let forms = Arc::new(FileFormTriggerRepository::open(&config.data_dir));
        let archives = Arc::new(FileArchiveRepository::open(&config.data_dir));

        let event_bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
        let metrics = Arc::new(MetricsRegistry::new());

        let approval_coordinator = Arc::new(ApprovalCoordinator::new(
            approvals.clone(),
            event_bus.clone(),
        ));
        let (form_coordinator, form_resume_rx) = FormCoordinator::new(forms.clone());
        let form_coordinator = Arc::new(form_coordinator);

        Ok(Self {
            config,
            executions,
            approvals,
            forms,
            archives,
            event_bus,
            metrics,
            approval_coordinator,
            form_coordinator,
            form_resume_rx,
        })
    }

    /// Build an [`ArchiveService`] over this context's repositories.
    ///
    /// No [`nebula_execution::StateManager`] is attached: the CLI never
    /// keeps one alive between invocations, so there is nothing for the
    /// service to evict from beyond the file-backed repository itself.
    pub fn archive_service(&self) -> ArchiveService {
        ArchiveService::new(
            self.executions.clone(),
            self.archives.clone(),
            Arc::new(NoWorkflowLookup),
        )
    }

    /// The execution budget every run/resume uses, derived from `config`.
    pub fn budget(&self) -> ExecutionBudget {
        ExecutionBudget {
            max_concurrent_nodes: self.config.max_concurrent_nodes,
            ..ExecutionBudget::default()
        }
    }

    /// Build a fresh [`WorkflowEngine`] for `workflow`: a demo action
    /// registry covering the built-in node types, an in-process sandbox
    /// that executes trusted actions directly, and every node's
    /// `action_id -> node_type` mapping registered.
    pub fn build_engine(&self, workflow: &WorkflowDefinition) -> WorkflowEngine {
        let registry = Arc::new(handlers::build_registry(
            self.approval_coordinator.clone(),
            self.form_coordinator.clone(),
        ));

        let registry_for_executor = registry.clone();
        let sandbox = Arc::new(InProcessSandbox::new(Arc::new(move |ctx, meta, input| {
            let registry = registry_for_executor.clone();
            let key = meta.key.clone();
            Box::pin(async move {
                let handler = registry
                    .get(&key)
                    .map_err(|e| nebula_action::ActionError::fatal(e.to_string()))?;
                // Every built-in handler registers as `IsolationLevel::None`, so
                // the runtime calls it directly and this executor never actually
                // runs — it exists so `ActionRuntime::new` has a `SandboxRunner`
                // to hold, the way a capability-gated deployment would need one.
                // Public identity fields carry over; scoped variables and
                // credential/resource providers don't survive the sandbox
                // boundary here.
                let inner = ctx.inner();
                let reconstructed = ActionContext::new(
                    inner.execution_id,
                    inner.node_id,
                    inner.workflow_id,
                    inner.scope,
                )
                .with_cancellation(inner.cancellation.clone());
                handler.execute(input, reconstructed).await
            })
        })));

        let runtime = Arc::new(ActionRuntime::new(
            registry,
            sandbox,
            DataPassingPolicy::default(),
            self.event_bus.clone(),
            self.metrics.clone(),
        ));

        let mut engine = WorkflowEngine::new(runtime, self.event_bus.clone(), self.metrics.clone());
        workflow_io::map_actions(&mut engine, workflow);
        engine
    }
}
