#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Archive
//!
//! The Archival Service: a periodic sweep that denormalizes terminal
//! executions into write-once [`nebula_persistence::ExecutionArchive`]
//! records and removes them from the live repository, followed by a
//! retention purge that drops archives past their retention window.
//!
//! Decoupled from the scheduler deliberately — a workflow reaching a
//! terminal state does not archive it synchronously. The sweep owns its own
//! cadence and batch size, matching the approval expiration sweep's shape.

pub mod error;
pub mod service;

pub use error::ArchiveError;
pub use service::{
    ArchiveService, NoWorkflowLookup, SweepReport, WorkflowLookup, DEFAULT_BATCH_SIZE,
    DEFAULT_MIN_AGE, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL,
};
