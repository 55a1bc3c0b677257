//! `nebula archive ...` — running the archival sweep by hand and inspecting
//! archived executions.

use clap::Subcommand;
use nebula_core::ExecutionId;

use crate::app::AppContext;

#[derive(Subcommand)]
pub enum ArchiveCommand {
    /// Run one archival sweep pass immediately: denormalize terminal
    /// executions past the minimum age, then purge archives past their
    /// retention window.
    Sweep {
        #[arg(long)]
        min_age_secs: Option<i64>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        retention_days: Option<i64>,
    },
    /// List every archived execution.
    List,
    /// Show one archived execution's full denormalized record.
    Get { execution_id: ExecutionId },
}

pub async fn run(ctx: &AppContext, cmd: ArchiveCommand) -> anyhow::Result<()> {
    match cmd {
        ArchiveCommand::Sweep {
            min_age_secs,
            batch_size,
            retention_days,
        } => {
            let min_age = chrono::Duration::seconds(min_age_secs.unwrap_or(ctx.config.archive_min_age_secs));
            let batch_size = batch_size.unwrap_or(ctx.config.archive_batch_size);
            let retention =
                chrono::Duration::days(retention_days.unwrap_or(ctx.config.archive_retention_days));

            let service = ctx.archive_service();
            let report = service.sweep_once(min_age, batch_size, retention).await?;
            println!(
                "archived={} failed={} purged={}",
                report.archived, report.failed, report.purged
            );
            Ok(())
        }
        ArchiveCommand::List => {
            for archive in ctx.archives.all() {
                println!(
                    "{}  execution={}  workflow={} v{}  status={:?}  archived_at={}",
                    archive.archive_id,
                    archive.execution_id,
                    archive.workflow_name,
                    archive.workflow_version,
                    archive.status,
                    archive.archived_at
                );
            }
            Ok(())
        }
        ArchiveCommand::Get { execution_id } => {
            use nebula_persistence::ArchiveRepository;
            let archive = ctx
                .archives
                .get(execution_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no archive recorded for execution {execution_id}"))?;
            println!("{}", serde_json::to_string_pretty(&archive)?);
            Ok(())
        }
    }
}
