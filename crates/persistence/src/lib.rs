#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Persistence
//!
//! Durable record shapes and repository ports for the state that must
//! survive a process restart: executions, approvals, form triggers and
//! their submissions, and execution archives.
//!
//! This crate defines the storage boundary, not the domain logic sitting in
//! front of it. `nebula-approval`, `nebula-form`, and `nebula-archive` each
//! depend on this crate for their repository and own the coordination rules
//! (resolution math, token rotation, sweep cadence) themselves. Keeping
//! storage ports here — rather than in each domain crate — means those
//! crates can share the same backend wiring and a single place defines what
//! "durable" means for this system.
//!
//! Every repository trait here is `async_trait` + `Send + Sync`, mirroring
//! the `CredentialProvider` port pattern from `nebula-action`: callers
//! program against the trait, and a process wires in whichever
//! implementation fits its deployment. Only an in-memory reference
//! implementation ships in this crate; a real deployment backs these with
//! Postgres, SQLite, or a KV store.

pub mod approval;
pub mod archive;
pub mod error;
pub mod execution;
pub mod file;
pub mod form;

pub use approval::{
    Approval, ApprovalActionRecord, ApprovalDecision, ApprovalMode, ApprovalRepository,
    ApprovalStatus, InMemoryApprovalRepository,
};
pub use archive::{build_archive, ArchivedNode, ArchiveRepository, ExecutionArchive, InMemoryArchiveRepository};
pub use error::PersistenceError;
pub use execution::{ExecutionRepository, InMemoryExecutionRepository};
pub use file::{
    FileApprovalRepository, FileArchiveRepository, FileExecutionRepository, FileFormTriggerRepository,
};
pub use form::{FormSubmission, FormTrigger, FormTriggerRepository, InMemoryFormTriggerRepository};
