//! `nebula form ...` — configuring, submitting to, and inspecting form
//! triggers.

use clap::Subcommand;
use nebula_core::{ExecutionId, FormTriggerId, NodeId, WorkflowId};

use crate::app::AppContext;

#[derive(Subcommand)]
pub enum FormCommand {
    /// Create a trigger for `(workflow_id, node_id)`, or update the existing
    /// one in place if it already has one.
    CreateOrUpdate {
        workflow_id: WorkflowId,
        node_id: NodeId,
        /// Form configuration (field schema, etc), as a JSON value.
        #[arg(long, default_value = "{}")]
        config: String,
        #[arg(long)]
        expires_in_days: Option<i64>,
        #[arg(long, default_value_t = 1)]
        max_submissions: u32,
        #[arg(long, default_value = "nebula-cli")]
        creator: String,
    },
    /// Submit data against the trigger addressed by `token`, resuming the
    /// execution suspended on it.
    Submit {
        token: String,
        execution_id: ExecutionId,
        /// Submitted form data, as a JSON value.
        #[arg(long, default_value = "{}")]
        data: String,
        #[arg(long)]
        by: Option<String>,
        #[arg(long)]
        ip: Option<String>,
    },
    /// Rotate a trigger's public token, invalidating the old one.
    RegenerateToken { trigger_id: FormTriggerId },
    /// Look up a trigger by its public token.
    GetByToken { token: String },
    /// List every trigger this data directory has a record of.
    List,
}

pub async fn run(ctx: &AppContext, cmd: FormCommand) -> anyhow::Result<()> {
    match cmd {
        FormCommand::CreateOrUpdate {
            workflow_id,
            node_id,
            config,
            expires_in_days,
            max_submissions,
            creator,
        } => {
            let config: serde_json::Value = serde_json::from_str(&config)?;
            let trigger = ctx
                .form_coordinator
                .create_or_update_trigger(workflow_id, node_id, config, expires_in_days, max_submissions, creator)
                .await?;
            println!("{}", serde_json::to_string_pretty(&trigger)?);
            Ok(())
        }
        FormCommand::Submit {
            token,
            execution_id,
            data,
            by,
            ip,
        } => {
            let trigger = ctx.form_coordinator.get_by_token(&token).await?;
            let data: serde_json::Value = serde_json::from_str(&data)?;
            let submission = ctx
                .form_coordinator
                .submit(trigger.workflow_id, execution_id, trigger.node_id, data, by, ip)
                .await?;
            println!("{}", serde_json::to_string_pretty(&submission)?);
            Ok(())
        }
        FormCommand::RegenerateToken { trigger_id } => {
            let trigger = ctx.form_coordinator.regenerate_token(trigger_id).await?;
            println!("{}", serde_json::to_string_pretty(&trigger)?);
            Ok(())
        }
        FormCommand::GetByToken { token } => {
            let trigger = ctx.form_coordinator.get_by_token(&token).await?;
            println!("{}", serde_json::to_string_pretty(&trigger)?);
            Ok(())
        }
        FormCommand::List => {
            for trigger in ctx.forms.all() {
                println!(
                    "{}  token={}  workflow={}  node={}  active={}  {}/{}",
                    trigger.trigger_id,
                    trigger.token,
                    trigger.workflow_id,
                    trigger.node_id,
                    trigger.active,
                    trigger.submission_count,
                    trigger.max_submissions
                );
            }
            Ok(())
        }
    }
}
