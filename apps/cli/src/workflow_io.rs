//! Loading workflow definitions from disk and wiring their nodes into an
//! engine's action-key map.

use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc::channel;

use anyhow::{bail, Context};
use nebula_engine::WorkflowEngine;
use nebula_workflow::WorkflowDefinition;
use notify::{RecursiveMode, Watcher};

use crate::handlers::BUILTIN_NODE_TYPES;

/// Load a [`WorkflowDefinition`] from a `.json` or `.yaml`/`.yml` file.
///
/// The format is dispatched on the file extension; anything else is
/// rejected rather than guessed at.
pub fn load_definition(path: &Path) -> anyhow::Result<WorkflowDefinition> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading workflow file {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("parsing {} as JSON", path.display())),
        Some("yaml" | "yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {} as YAML", path.display())),
        other => bail!(
            "unrecognized workflow file extension {:?} (expected .json, .yaml, or .yml)",
            other
        ),
    }
}

/// Register every node's `action_id -> node_type` mapping on `engine`, so the
/// runtime's action registry resolves each node at dispatch time.
///
/// A node with an empty `node_type` is skipped; [`nebula_workflow::parse_with_known_types`]
/// is expected to have already flagged that as a validation warning.
pub fn map_actions(engine: &mut WorkflowEngine, workflow: &WorkflowDefinition) {
    for node in &workflow.nodes {
        if node.node_type.is_empty() {
            continue;
        }
        engine.map_action(node.action_id, node.node_type.clone());
    }
}

/// Re-run [`load_definition`] and [`nebula_workflow::parse_with_known_types`]
/// every time `path` changes on disk, printing the report each time.
///
/// Blocks the calling thread until interrupted (Ctrl-C). Meant for editor
/// loops: keep this running in a side terminal while hand-authoring a
/// workflow definition.
pub fn watch_and_validate(path: &Path) -> anyhow::Result<()> {
    let known_types: HashSet<String> = BUILTIN_NODE_TYPES.iter().map(|s| s.to_string()).collect();

    let validate_once = |path: &Path| match load_definition(path) {
        Ok(definition) => {
            let report = nebula_workflow::parse_with_known_types(&definition, Some(&known_types));
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("error: failed to render validation report: {err}"),
            }
        }
        Err(err) => eprintln!("error: {err:#}"),
    };

    println!("watching {} for changes (Ctrl-C to stop)", path.display());
    validate_once(path);

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("creating filesystem watcher")?;
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", path.display()))?;

    for event in rx {
        match event {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => validate_once(path),
            Ok(_) => {}
            Err(err) => eprintln!("watch error: {err}"),
        }
    }

    Ok(())
}
