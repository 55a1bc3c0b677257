//! Layered CLI configuration: built-in defaults, an optional TOML file,
//! then environment variables, in that order.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the `nebula` CLI.
///
/// Resolution order (later wins): built-in defaults, `<config_path>` if it
/// exists, then `NEBULA_*` environment variables. `--config`/`--data-dir`
/// flags on individual subcommands override the merged result directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the JSON snapshots (`executions.json`,
    /// `approvals.json`, `form_triggers.json`, `form_submissions.json`,
    /// `archives.json`) that give state continuity across CLI invocations.
    pub data_dir: PathBuf,
    /// Nodes executing concurrently within a single execution.
    pub max_concurrent_nodes: usize,
    /// Soft per-node timeout, absent a workflow-level override.
    pub node_timeout_ms: u64,
    /// Approval expiration sweep cadence, in seconds.
    pub approval_sweep_interval_secs: u64,
    /// Archival sweep cadence, in seconds.
    pub archive_sweep_interval_secs: u64,
    /// Minimum age, in seconds, a terminal execution must reach before
    /// the archival sweep picks it up.
    pub archive_min_age_secs: i64,
    /// How long, in days, an archive is retained before the retention
    /// purge removes it.
    pub archive_retention_days: i64,
    /// Executions archived per sweep pass.
    pub archive_batch_size: usize,
    /// `tracing`/`NEBULA_LOG` filter directive, e.g. `"info"` or
    /// `"nebula_engine=debug,warn"`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_concurrent_nodes: 10,
            node_timeout_ms: 300_000,
            approval_sweep_interval_secs: 60,
            archive_sweep_interval_secs: 300,
            archive_min_age_secs: 900,
            archive_retention_days: 30,
            archive_batch_size: 100,
            log_filter: "info".to_owned(),
        }
    }
}

/// `~/.local/share/nebula` (or platform equivalent), falling back to
/// `./nebula-data` when no home directory can be resolved.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("nebula"))
        .unwrap_or_else(|| PathBuf::from("./nebula-data"))
}

impl Config {
    /// Load configuration from defaults, `config_path` (if it exists), and
    /// `NEBULA_`-prefixed environment variables.
    pub fn load(config_path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        } else {
            let default_path = default_config_path();
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
        }

        figment = figment.merge(Env::prefixed("NEBULA_"));
        Ok(figment.extract()?)
    }
}

/// `~/.config/nebula/config.toml` (or platform equivalent).
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("nebula").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("nebula.toml"))
}
