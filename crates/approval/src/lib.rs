#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Approval
//!
//! The Approval Coordinator: multi-user approval gates with `any`/`all`/
//! `majority` resolution, per-user idempotency, and an expiration sweep.
//!
//! Durable storage lives in `nebula-persistence`; this crate owns the
//! business rules sitting in front of it and emits `APPROVAL_CREATED`/
//! `APPROVAL_ACTION`/`APPROVAL_RESOLVED` events the scheduler observes to
//! un-suspend a waiting execution.

pub mod coordinator;
pub mod error;

pub use coordinator::{ApprovalCoordinator, DEFAULT_SWEEP_INTERVAL};
pub use error::ApprovalError;
