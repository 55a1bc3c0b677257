//! Errors raised while building or validating a workflow graph.

use nebula_core::id::NodeId;
use thiserror::Error;

/// Errors from DAG construction and validation.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The definition has no nodes.
    #[error("workflow has no nodes")]
    EmptyDefinition,

    /// A connection references a node id that does not exist.
    #[error("connection references unknown node: {0}")]
    UnknownNode(NodeId),

    /// The graph contains a cycle.
    #[error("cycle detected among nodes: {0:?}")]
    CycleDetected(Vec<NodeId>),
}
