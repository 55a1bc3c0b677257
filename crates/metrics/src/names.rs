//! Canonical metric names.
//!
//! [`nebula_telemetry::metrics::MetricsRegistry`] creates a metric the first
//! time it's asked for by name, so nothing stops two call sites from
//! drifting onto slightly different strings for the same concept. These
//! constants are the single source of truth; call sites that record
//! executions, nodes, approvals, forms, archival, or event-bus backpressure
//! should use them rather than inlining string literals.
//!
//! Naming follows the Prometheus convention already in use by
//! `nebula-runtime` (`_total` for monotonic counters, `_seconds` for
//! durations).

/// Executions started, labeled only by count (no workflow dimension, to
/// keep label cardinality bounded).
pub const EXECUTIONS_STARTED_TOTAL: &str = "nebula_executions_started_total";
/// Executions that reached `Completed`.
pub const EXECUTIONS_COMPLETED_TOTAL: &str = "nebula_executions_completed_total";
/// Executions that reached `Failed` or `TimedOut`.
pub const EXECUTIONS_FAILED_TOTAL: &str = "nebula_executions_failed_total";
/// Executions that reached `Cancelled`.
pub const EXECUTIONS_CANCELLED_TOTAL: &str = "nebula_executions_cancelled_total";
/// Wall-clock duration of a completed execution, in seconds.
pub const EXECUTION_DURATION_SECONDS: &str = "nebula_execution_duration_seconds";

/// Node actions dispatched to a handler. Matches the string literal
/// `nebula-runtime` already records under; kept identical so existing call
/// sites adopt the constant without changing emitted series.
pub const ACTIONS_EXECUTED_TOTAL: &str = "actions_executed_total";
/// Node actions whose handler returned an error or exceeded a data limit.
pub const ACTIONS_FAILED_TOTAL: &str = "actions_failed_total";
/// Per-action execution duration, in seconds.
pub const ACTION_DURATION_SECONDS: &str = "action_duration_seconds";

/// Approval gates created.
pub const APPROVALS_CREATED_TOTAL: &str = "nebula_approvals_created_total";
/// Approval gates resolved, regardless of outcome.
pub const APPROVALS_RESOLVED_TOTAL: &str = "nebula_approvals_resolved_total";
/// Approval gates the expiration sweep marked `expired`.
pub const APPROVALS_EXPIRED_TOTAL: &str = "nebula_approvals_expired_total";

/// Form submissions accepted.
pub const FORM_SUBMISSIONS_TOTAL: &str = "nebula_form_submissions_total";
/// Form submissions rejected (duplicate, closed trigger, or expired token).
pub const FORM_SUBMISSIONS_REJECTED_TOTAL: &str = "nebula_form_submissions_rejected_total";

/// Executions the archival sweep denormalized and removed from the live
/// repository.
pub const ARCHIVE_SWEPT_TOTAL: &str = "nebula_archive_swept_total";
/// Archive records the retention purge deleted.
pub const ARCHIVE_PURGED_TOTAL: &str = "nebula_archive_purged_total";

/// Events a subscriber dropped because its queue was full.
pub const EVENTBUS_DROPPED_TOTAL: &str = "nebula_eventbus_dropped_total";
/// Current number of active event-bus subscribers.
pub const EVENTBUS_SUBSCRIBERS: &str = "nebula_eventbus_subscribers";
