#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Form
//!
//! The Form Coordinator: webhook-style form triggers one execution's node
//! can suspend on, with idempotent submission and atomic token rotation.
//!
//! Durable storage lives in `nebula-persistence`; this crate owns the
//! `createOrUpdateFormTrigger`/`submit`/`regenerateToken` operations and the
//! resume signal the scheduler consumes to re-arm a suspended execution.

pub mod coordinator;
pub mod error;
pub mod token;

pub use coordinator::{FormCoordinator, ResumeSignal};
pub use error::FormError;
pub use token::generate_token;
