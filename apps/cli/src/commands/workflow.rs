//! `nebula workflow ...` — validating a workflow definition file offline,
//! without running it.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Subcommand;

use crate::handlers::BUILTIN_NODE_TYPES;
use crate::workflow_io;

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Parse a workflow definition and report validation errors/warnings
    /// without executing it.
    Validate {
        /// Path to the workflow definition (`.json`, `.yaml`, or `.yml`).
        path: PathBuf,
    },
}

pub fn run(cmd: WorkflowCommand) -> anyhow::Result<()> {
    match cmd {
        WorkflowCommand::Validate { path } => validate(&path),
    }
}

fn validate(path: &std::path::Path) -> anyhow::Result<()> {
    let definition = workflow_io::load_definition(path)?;
    let known_types: HashSet<String> = BUILTIN_NODE_TYPES.iter().map(|s| s.to_string()).collect();
    let report = nebula_workflow::parse_with_known_types(&definition, Some(&known_types));

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.valid {
        anyhow::bail!("workflow is invalid");
    }
    Ok(())
}
