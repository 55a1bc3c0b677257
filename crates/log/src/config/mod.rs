//! Runtime logger configuration.

mod presets;

use serde::{Deserialize, Serialize};

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    Compact,
    Pretty,
    Json,
    Logfmt,
}

/// Controls what the formatter renders alongside the message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub colors: bool,
    pub source: bool,
    pub time: bool,
    pub flatten: bool,
}

impl DisplayConfig {
    /// Overlay `NEBULA_LOG_COLORS` / `NEBULA_LOG_SOURCE` onto the current values.
    pub fn parse_env(&mut self) {
        if let Ok(v) = std::env::var("NEBULA_LOG_COLORS") {
            self.colors = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("NEBULA_LOG_SOURCE") {
            self.source = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}

/// Service identity fields attached to every log line via a root span.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fields {
    pub service: Option<String>,
    pub env: Option<String>,
    pub version: Option<String>,
    pub instance: Option<String>,
    pub region: Option<String>,
}

impl Fields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.env.is_none()
            && self.version.is_none()
            && self.instance.is_none()
            && self.region.is_none()
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self {
            service: std::env::var("NEBULA_SERVICE").ok(),
            env: std::env::var("NEBULA_ENV").ok(),
            version: std::env::var("NEBULA_VERSION").ok(),
            instance: std::env::var("NEBULA_INSTANCE").ok(),
            region: std::env::var("NEBULA_REGION").ok(),
        }
    }
}

/// Where formatted log lines are written.
#[derive(Debug, Clone, Default)]
pub enum WriterConfig {
    #[default]
    Stdout,
    Stderr,
    #[cfg(feature = "file")]
    File { directory: String, file_name: String },
}

/// Top-level logger configuration.
///
/// Build via [`Config::development`], [`Config::production`],
/// [`Config::from_env`], or `Config { level: ..., ..Default::default() }`.
#[derive(Debug, Clone)]
pub struct Config {
    pub level: String,
    pub format: Format,
    pub display: DisplayConfig,
    pub fields: Fields,
    pub reloadable: bool,
    pub writer: WriterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            fields: Fields::default(),
            reloadable: false,
            writer: WriterConfig::default(),
        }
    }
}
