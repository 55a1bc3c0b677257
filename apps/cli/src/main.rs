//! `nebula` — a command-line front end for the workflow execution engine.
//!
//! Each invocation is a separate OS process: durable state (executions,
//! approvals, form triggers/submissions, archives) lives under
//! [`Config::data_dir`](config::Config::data_dir) as JSON snapshots so state
//! survives between commands. See [`app::AppContext`] for how that's wired.

mod app;
mod commands;
mod config;
mod handlers;
mod workflow_io;

#[cfg(feature = "tui")]
mod tui;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use app::AppContext;
use commands::{approval::ApprovalCommand, archive::ArchiveCommand, execution::ExecutionCommand, form::FormCommand, workflow::WorkflowCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "nebula", about = "Command-line interface for the Nebula workflow engine", version)]
struct Cli {
    /// Path to a TOML config file. Defaults to the platform config
    /// directory if present; falls back to built-in defaults otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the data directory holding the JSON snapshots.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run, inspect, cancel, retry, and resume workflow executions.
    #[command(subcommand)]
    Execution(ExecutionCommand),
    /// Create, decide, and inspect approval gates.
    #[command(subcommand)]
    Approval(ApprovalCommand),
    /// Configure, submit to, and inspect form triggers.
    #[command(subcommand)]
    Form(FormCommand),
    /// Run the archival sweep and inspect archived executions.
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Validate workflow definitions.
    #[command(subcommand)]
    Workflow(WorkflowCommand),
    /// Re-validate a workflow definition every time the file changes.
    Watch {
        /// Path to the workflow definition to watch.
        path: PathBuf,
    },
    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Launch the interactive dashboard.
    #[cfg(feature = "tui")]
    Dashboard,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let _log_guard = nebula_log::auto_init()?;

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_owned();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Watch { path } => return workflow_io::watch_and_validate(&path),
        _ => {}
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Execution(cmd) => commands::execution::run(&ctx, cmd).await,
        Commands::Approval(cmd) => commands::approval::run(&ctx, cmd).await,
        Commands::Form(cmd) => commands::form::run(&ctx, cmd).await,
        Commands::Archive(cmd) => commands::archive::run(&ctx, cmd).await,
        Commands::Workflow(cmd) => commands::workflow::run(cmd),
        #[cfg(feature = "tui")]
        Commands::Dashboard => tui::run(&ctx).await,
        Commands::Completions { .. } | Commands::Watch { .. } => unreachable!("handled above"),
    }
}
