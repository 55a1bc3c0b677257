//! `nebula execution ...` — run, inspect, cancel, retry, and resume
//! workflow executions.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use nebula_core::{ExecutionId, NodeId};
use nebula_execution::ExecutionStatus;

use crate::app::AppContext;
use crate::workflow_io;

#[derive(Subcommand)]
pub enum ExecutionCommand {
    /// Run a workflow definition to completion (or suspension).
    Run {
        /// Path to the workflow definition.
        workflow: PathBuf,
        /// JSON input handed to the workflow's entry nodes. Defaults to `{}`.
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// List every execution this data directory has a record of.
    List,
    /// Show one execution's full state.
    Get {
        execution_id: ExecutionId,
    },
    /// Show the per-node state (attempts, output, errors) for one execution.
    NodeExecutions {
        execution_id: ExecutionId,
    },
    /// Show a single node's recorded output for an execution.
    Output {
        execution_id: ExecutionId,
        node_id: NodeId,
    },
    /// Cancel a suspended execution.
    ///
    /// Only executions currently `Waiting` can be cancelled this way: a CLI
    /// invocation runs a workflow to completion (or suspension) before
    /// exiting, so there is no other process holding a live handle to
    /// signal mid-flight the way `WorkflowEngine::cancel_execution` does
    /// within a single run.
    Cancel {
        execution_id: ExecutionId,
        #[arg(long, default_value = "cancelled via CLI")]
        reason: String,
    },
    /// Build and run a fresh execution that retries a terminal, unsuccessful
    /// one, carrying its trigger input forward.
    Retry {
        execution_id: ExecutionId,
        /// The same workflow definition the original execution ran.
        workflow: PathBuf,
    },
    /// Resume a `Waiting` execution.
    Resume {
        execution_id: ExecutionId,
        /// The same workflow definition the original execution ran.
        workflow: PathBuf,
        /// JSON payload to complete the waiting node with directly. If
        /// omitted, the node re-enters the scheduler and its action runs
        /// again.
        #[arg(long)]
        data: Option<String>,
    },
}

pub async fn run(ctx: &AppContext, cmd: ExecutionCommand) -> anyhow::Result<()> {
    match cmd {
        ExecutionCommand::Run { workflow, input } => run_workflow(ctx, &workflow, &input).await,
        ExecutionCommand::List => list(ctx).await,
        ExecutionCommand::Get { execution_id } => get(ctx, execution_id).await,
        ExecutionCommand::NodeExecutions { execution_id } => node_executions(ctx, execution_id).await,
        ExecutionCommand::Output { execution_id, node_id } => output(ctx, execution_id, node_id).await,
        ExecutionCommand::Cancel { execution_id, reason } => cancel(ctx, execution_id, &reason).await,
        ExecutionCommand::Retry { execution_id, workflow } => retry(ctx, execution_id, &workflow).await,
        ExecutionCommand::Resume { execution_id, workflow, data } => {
            resume(ctx, execution_id, &workflow, data).await
        }
    }
}

async fn run_workflow(ctx: &AppContext, workflow_path: &std::path::Path, input: &str) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let definition = workflow_io::load_definition(workflow_path)?;
    let input: serde_json::Value =
        serde_json::from_str(input).context("--input must be valid JSON")?;

    let engine = ctx.build_engine(&definition);
    let result = engine
        .execute_workflow(&definition, input, ctx.budget())
        .await?;

    ctx.executions.save(result.exec_state.clone()).await?;
    print_execution_summary(&result.execution_id, result.status, result.waiting_node_id);
    Ok(())
}

async fn list(ctx: &AppContext) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let mut executions = ctx.executions.list().await?;
    executions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for state in executions {
        println!(
            "{}  {:<10}  workflow={}  created_at={}",
            state.execution_id, status_label(state.status), state.workflow_id, state.created_at
        );
    }
    Ok(())
}

async fn get(ctx: &AppContext, execution_id: ExecutionId) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let state = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn node_executions(ctx: &AppContext, execution_id: ExecutionId) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let state = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;

    for (node_id, node_state) in &state.node_states {
        println!(
            "{}  {:<10}  attempts={}  error={}",
            node_id,
            format!("{:?}", node_state.state),
            node_state.attempt_count(),
            node_state.error_message.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn output(ctx: &AppContext, execution_id: ExecutionId, node_id: NodeId) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let state = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;

    let node_state = state
        .node_states
        .get(&node_id)
        .ok_or_else(|| anyhow::anyhow!("node {node_id} is not part of execution {execution_id}"))?;
    let output = node_state
        .current_output
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("node {node_id} has not produced an output"))?;

    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

async fn cancel(ctx: &AppContext, execution_id: ExecutionId, reason: &str) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let mut state = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;

    if state.status != ExecutionStatus::Waiting {
        anyhow::bail!(
            "execution {execution_id} is {:?}, not Waiting — only a suspended execution can be \
             cancelled after the process that ran it has exited",
            state.status
        );
    }

    state.transition_status(ExecutionStatus::Cancelling)?;
    state.transition_to_cancelled(reason.to_owned())?;
    ctx.executions.save(state).await?;

    println!("{execution_id}  cancelled");
    Ok(())
}

async fn retry(ctx: &AppContext, execution_id: ExecutionId, workflow_path: &std::path::Path) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let original = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;

    let definition = workflow_io::load_definition(workflow_path)?;
    if definition.id != original.workflow_id {
        anyhow::bail!(
            "workflow file describes {}, but execution {execution_id} ran {}",
            definition.id,
            original.workflow_id
        );
    }

    // `WorkflowEngine::execute_workflow` always mints its own execution id,
    // so there is no way to hand it a pre-built retried `ExecutionState`.
    // Validate retry eligibility up front, run fresh, then stamp the
    // lineage fields onto the state it returns before persisting it.
    if !matches!(
        original.status,
        ExecutionStatus::Failed | ExecutionStatus::Cancelled | ExecutionStatus::TimedOut
    ) {
        anyhow::bail!("execution {execution_id} is {:?}, not retryable", original.status);
    }
    if original.retry_count >= original.max_retries {
        anyhow::bail!(
            "execution {execution_id} has reached its retry limit ({}/{})",
            original.retry_count,
            original.max_retries
        );
    }

    let engine = ctx.build_engine(&definition);
    let input = serde_json::Value::Object(original.variables.clone());
    let mut result = engine.execute_workflow(&definition, input, ctx.budget()).await?;

    result.exec_state.retry_of = Some(execution_id);
    result.exec_state.retry_count = original.retry_count + 1;
    result.exec_state.max_retries = original.max_retries;

    ctx.executions.save(result.exec_state.clone()).await?;
    println!("retried {execution_id} as {}", result.execution_id);
    print_execution_summary(&result.execution_id, result.status, result.waiting_node_id);
    Ok(())
}

async fn resume(
    ctx: &AppContext,
    execution_id: ExecutionId,
    workflow_path: &std::path::Path,
    data: Option<String>,
) -> anyhow::Result<()> {
    use nebula_persistence::ExecutionRepository;
    let exec_state = ctx
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no execution recorded with id {execution_id}"))?;

    let definition = workflow_io::load_definition(workflow_path)?;
    let resume_data = data
        .map(|d| serde_json::from_str(&d))
        .transpose()
        .context("--data must be valid JSON")?;

    let engine = ctx.build_engine(&definition);
    let result = engine
        .resume_workflow(&definition, exec_state, resume_data, ctx.budget())
        .await?;

    ctx.executions.save(result.exec_state.clone()).await?;
    print_execution_summary(&result.execution_id, result.status, result.waiting_node_id);
    Ok(())
}

fn print_execution_summary(
    execution_id: &ExecutionId,
    status: ExecutionStatus,
    waiting_node_id: Option<NodeId>,
) {
    match waiting_node_id {
        Some(node_id) => println!("{execution_id}  {}  waiting_on={node_id}", status_label(status)),
        None => println!("{execution_id}  {}", status_label(status)),
    }
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Created => "created",
        ExecutionStatus::Running => "running",
        ExecutionStatus::Paused => "paused",
        ExecutionStatus::Cancelling => "cancelling",
        ExecutionStatus::Waiting => "waiting",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
        ExecutionStatus::TimedOut => "timed_out",
    }
}
