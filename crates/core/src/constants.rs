//! Process-wide default constants for the execution engine.
//!
//! These mirror the "Configuration" keys in the engine specification and
//! serve as fallback defaults when a layered config source does not
//! override them.

use std::time::Duration;

/// Default per-execution concurrency cap (`worker.perExecutionCap`).
pub const DEFAULT_PER_EXECUTION_CAP: usize = 8;

/// Default per-node soft timeout (`node.defaultTimeoutMs`).
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default maximum automatic retries for a failed execution.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default approval-expiration sweep interval (`approval.sweepInterval`).
pub const DEFAULT_APPROVAL_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default bounded per-subscriber event queue depth
/// (`event.subscriberQueueDepth`).
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 256;

/// Default archive retention window in days (`archive.retentionDays`).
pub const DEFAULT_ARCHIVE_RETENTION_DAYS: u32 = 30;

/// Default per-sweep archival batch cap (`archive.batchSize`).
pub const DEFAULT_ARCHIVE_BATCH_SIZE: usize = 100;

/// Length, in characters, of a generated form token.
pub const FORM_TOKEN_LENGTH: usize = 32;
