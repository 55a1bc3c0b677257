//! Flow/FlowVersion definition types: nodes, edges, and workflow-level
//! configuration.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use nebula_core::id::{ActionId, NodeId, WorkflowId};
use nebula_core::Version;
use serde::{Deserialize, Serialize};

use crate::param::ParamValue;

/// One node inside a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique id of this node within its workflow.
    pub id: NodeId,
    /// Human-readable name (editor label).
    pub name: String,
    /// The action this node dispatches to at runtime.
    pub action_id: ActionId,
    /// Handler-registry key (the node's `type`); empty until assigned.
    pub node_type: String,
    /// Configuration parameters, pre-expression-resolution.
    pub params: HashMap<String, ParamValue>,
    /// Whether this node is a trigger (entry-point eligible regardless of
    /// inbound edges).
    pub is_trigger: bool,
    /// For `errorTrigger` nodes: the set of `errorType` strings this node
    /// catches. Empty means "catches nothing" (not "catches everything").
    pub error_types: HashSet<String>,
    /// Credential id to resolve via `CredentialResolver` before dispatch,
    /// if this node's handler needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

impl NodeDefinition {
    /// Construct a node with the minimum required fields.
    pub fn new(id: NodeId, name: impl Into<String>, action_id: ActionId) -> Self {
        Self {
            id,
            name: name.into(),
            action_id,
            node_type: String::new(),
            params: HashMap::new(),
            is_trigger: false,
            error_types: HashSet::new(),
            credential_id: None,
        }
    }

    /// Set the handler-registry type key.
    #[must_use]
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    /// Set the node's parameters.
    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, ParamValue>) -> Self {
        self.params = params;
        self
    }

    /// Mark this node as a trigger (entry point eligible).
    #[must_use]
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Set the error types this `errorTrigger` node catches.
    #[must_use]
    pub fn with_error_types(mut self, error_types: HashSet<String>) -> Self {
        self.error_types = error_types;
        self
    }

    /// Set the credential this node resolves before dispatch.
    #[must_use]
    pub fn with_credential_id(mut self, credential_id: impl Into<String>) -> Self {
        self.credential_id = Some(credential_id.into());
        self
    }
}

/// A directed link between two nodes, optionally over named handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Upstream node id.
    pub from: NodeId,
    /// Downstream node id.
    pub to: NodeId,
    /// Named outbound handle on `from` (e.g. a switch case). `None` means
    /// the node's single default output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Named inbound handle on `to`. Rarely used; most handlers have a
    /// single input port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Connection {
    /// Construct a plain connection with no named handles.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            from,
            to,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Construct a connection over a named source handle (branch/case).
    pub fn from_handle(from: NodeId, source_handle: impl Into<String>, to: NodeId) -> Self {
        Self {
            from,
            to,
            source_handle: Some(source_handle.into()),
            target_handle: None,
        }
    }
}

/// Workflow-level execution configuration, overriding process defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Per-execution concurrency cap override (`worker.perExecutionCap`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_nodes: Option<usize>,
    /// Per-node soft timeout override, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_timeout_ms: Option<u64>,
    /// Maximum automatic scheduler-level retries for this workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// An immutable workflow graph definition (a `FlowVersion`'s `definition`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Identity of the flow this definition belongs to.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Semantic version of this flow version.
    pub version: Version,
    /// All nodes in the graph, in authoring order (used for deterministic
    /// tie-breaking in the topological order).
    pub nodes: Vec<NodeDefinition>,
    /// All directed edges in the graph.
    pub connections: Vec<Connection>,
    /// Flow-level variables available to every node.
    pub variables: HashMap<String, serde_json::Value>,
    /// Execution configuration overrides.
    pub config: WorkflowConfig,
    /// Free-form organizational tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl NodeDefinition {
    /// Returns `true` if this node has no dependents registered via
    /// `error_types` (i.e. is not configured as an error trigger).
    #[must_use]
    pub fn is_error_trigger(&self) -> bool {
        !self.error_types.is_empty()
    }
}
