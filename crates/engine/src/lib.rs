//! # Nebula Engine
//!
//! The workflow execution engine: builds execution plans from
//! [`nebula_workflow::WorkflowDefinition`]s, resolves node parameters,
//! dispatches actions to the `ActionRuntime`, and reports the final
//! [`ExecutionResult`].

mod engine;
mod error;
mod resolver;
mod result;

pub use engine::WorkflowEngine;
pub use error::EngineError;
pub use result::ExecutionResult;
