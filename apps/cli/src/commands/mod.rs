//! Subcommand implementations, one module per spec area.

pub mod approval;
pub mod archive;
pub mod execution;
pub mod form;
pub mod workflow;
