//! Resource types threaded through [`super::context`] scopes.

/// Minimum severity level a hook should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct NotificationPrefs {
    pub email_enabled: bool,
    pub email_addresses: Vec<String>,
    pub webhook_enabled: bool,
    pub min_severity: NotificationSeverity,
    pub rate_limit_per_hour: u32,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email_enabled: false,
            email_addresses: Vec::new(),
            webhook_enabled: false,
            min_severity: NotificationSeverity::Error,
            rate_limit_per_hour: 10,
        }
    }
}

/// Per-node/execution logging configuration, carried in the resource map of
/// [`super::context::ExecutionContext`] / [`super::context::NodeContext`] and
/// merged span-like by [`super::span::get_current_logger_resource`].
#[derive(Debug, Clone, Default)]
pub struct LoggerResource {
    sentry_dsn: Option<String>,
    webhook_url: Option<String>,
    pub log_level: LogLevel,
    pub tags: Vec<(String, String)>,
    pub notification_prefs: NotificationPrefs,
    pub sampling_enabled: bool,
    pub sampling_rate: f64,
}

impl LoggerResource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sentry_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.sentry_dsn = Some(dsn.into());
        self
    }

    #[must_use]
    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, rate: f64) -> Self {
        self.sampling_enabled = true;
        self.sampling_rate = rate;
        self
    }

    #[must_use]
    pub fn sentry_dsn(&self) -> Option<&str> {
        self.sentry_dsn.as_deref()
    }

    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }
}
