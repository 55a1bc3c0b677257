//! `nebula approval ...` — creating, deciding, and inspecting approval
//! gates.

use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use nebula_core::{ApprovalId, ExecutionId, NodeId};
use nebula_persistence::{ApprovalDecision, ApprovalMode};

use crate::app::AppContext;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Any,
    All,
    Majority,
}

impl From<ModeArg> for ApprovalMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Any => ApprovalMode::Any,
            ModeArg::All => ApprovalMode::All,
            ModeArg::Majority => ApprovalMode::Majority,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
}

impl From<DecisionArg> for ApprovalDecision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Approve => ApprovalDecision::Approve,
            DecisionArg::Reject => ApprovalDecision::Reject,
        }
    }
}

#[derive(Subcommand)]
pub enum ApprovalCommand {
    /// Create a standalone approval gate (most gates are created implicitly
    /// by a `wait.approval` node; this is for exercising the flow by hand).
    Create {
        execution_id: ExecutionId,
        node_id: NodeId,
        #[arg(long, value_enum, default_value = "any")]
        mode: ModeArg,
        #[arg(long, default_value_t = 1)]
        required_approvers: u32,
        #[arg(long, default_value = "approval required")]
        message: String,
        #[arg(long)]
        expires_in_secs: Option<u64>,
    },
    /// Record an approve/reject decision.
    Submit {
        approval_id: ApprovalId,
        user_id: String,
        #[arg(value_enum)]
        decision: DecisionArg,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show one approval's full state.
    Get { approval_id: ApprovalId },
    /// Cancel a pending approval.
    Cancel { approval_id: ApprovalId },
    /// List every approval this data directory has a record of.
    List,
}

pub async fn run(ctx: &AppContext, cmd: ApprovalCommand) -> anyhow::Result<()> {
    match cmd {
        ApprovalCommand::Create {
            execution_id,
            node_id,
            mode,
            required_approvers,
            message,
            expires_in_secs,
        } => {
            let approval = ctx
                .approval_coordinator
                .create_approval(
                    execution_id,
                    node_id,
                    mode.into(),
                    required_approvers,
                    message,
                    expires_in_secs.map(Duration::from_secs),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&approval)?);
            Ok(())
        }
        ApprovalCommand::Submit {
            approval_id,
            user_id,
            decision,
            comment,
        } => {
            let approval = ctx
                .approval_coordinator
                .submit_approval(approval_id, user_id, decision.into(), comment)
                .await?;
            println!("{}", serde_json::to_string_pretty(&approval)?);
            Ok(())
        }
        ApprovalCommand::Get { approval_id } => {
            let approval = ctx.approval_coordinator.get_approval(approval_id).await?;
            println!("{}", serde_json::to_string_pretty(&approval)?);
            Ok(())
        }
        ApprovalCommand::Cancel { approval_id } => {
            let approval = ctx.approval_coordinator.cancel_approval(approval_id).await?;
            println!("{}", serde_json::to_string_pretty(&approval)?);
            Ok(())
        }
        ApprovalCommand::List => {
            for approval in ctx.approvals.all() {
                println!(
                    "{}  {:?}  execution={}  node={}  {}/{} approvers",
                    approval.approval_id,
                    approval.status,
                    approval.execution_id,
                    approval.node_id,
                    approval.actions.len(),
                    approval.required_approvers
                );
            }
            Ok(())
        }
    }
}
