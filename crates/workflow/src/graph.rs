//! The DAG Parser: validates a workflow definition and derives readiness
//! data (dependency map, topological order, parallel levels) from it.
//!
//! Node and edge storage uses `petgraph`, the same crate
//! `nebula-resource`'s dependency manager builds its graph on; cycle
//! detection uses `petgraph`'s strongly-connected-components, while the
//! deterministic topological order is Kahn's algorithm hand-rolled over
//! that storage, matching `nebula-resource`'s own ordering pass (ties
//! broken by authoring order rather than petgraph's DFS order, which the
//! spec does not guarantee to be stable across runs).

use std::collections::{HashMap, HashSet, VecDeque};

use nebula_core::id::NodeId;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use crate::definition::{Connection, WorkflowDefinition};
use crate::error::WorkflowError;

/// A validated, queryable view of a workflow's dependency structure.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    node_ids: Vec<NodeId>,
    trigger_nodes: HashSet<NodeId>,
    inner: DiGraph<NodeId, ()>,
    dependencies: HashMap<NodeId, Vec<NodeId>>,
    outgoing: HashMap<NodeId, Vec<Connection>>,
}

impl DependencyGraph {
    /// Build a graph from a workflow definition, rejecting dangling edges
    /// and cycles outright.
    pub fn from_definition(workflow: &WorkflowDefinition) -> Result<Self, WorkflowError> {
        if workflow.nodes.is_empty() {
            return Err(WorkflowError::EmptyDefinition);
        }

        let node_ids: Vec<NodeId> = workflow.nodes.iter().map(|n| n.id).collect();
        let known: HashSet<NodeId> = node_ids.iter().copied().collect();
        let trigger_nodes: HashSet<NodeId> = workflow
            .nodes
            .iter()
            .filter(|n| n.is_trigger)
            .map(|n| n.id)
            .collect();

        let mut inner = DiGraph::new();
        let mut index_of = HashMap::with_capacity(node_ids.len());
        for id in &node_ids {
            index_of.insert(*id, inner.add_node(*id));
        }

        let mut dependencies: HashMap<NodeId, Vec<NodeId>> =
            node_ids.iter().map(|id| (*id, Vec::new())).collect();
        let mut outgoing: HashMap<NodeId, Vec<Connection>> =
            node_ids.iter().map(|id| (*id, Vec::new())).collect();

        for conn in &workflow.connections {
            if !known.contains(&conn.from) {
                return Err(WorkflowError::UnknownNode(conn.from));
            }
            if !known.contains(&conn.to) {
                return Err(WorkflowError::UnknownNode(conn.to));
            }
            inner.add_edge(index_of[&conn.from], index_of[&conn.to], ());
            dependencies.entry(conn.to).or_default().push(conn.from);
            outgoing.entry(conn.from).or_default().push(conn.clone());
        }

        let graph = Self {
            node_ids,
            trigger_nodes,
            inner,
            dependencies,
            outgoing,
        };

        if let Some(cycle) = graph.find_cycle() {
            return Err(WorkflowError::CycleDetected(cycle));
        }

        Ok(graph)
    }

    /// Total number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// All node ids, in authoring order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// Immediate upstream dependencies of a node (empty slice if none or
    /// unknown).
    #[must_use]
    pub fn predecessors(&self, node_id: NodeId) -> &[NodeId] {
        self.dependencies
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outbound connections from a node, carrying their source handle
    /// (used by the scheduler for branch/skip propagation).
    #[must_use]
    pub fn outgoing(&self, node_id: NodeId) -> &[Connection] {
        self.outgoing
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes with no inbound edges (topology-only; does not consider the
    /// trigger flag — see [`Self::trigger_entry_points`] for the
    /// spec-level "entry point" definition used in validation reports).
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.node_ids
            .iter()
            .copied()
            .filter(|id| self.dependencies.get(id).is_none_or(Vec::is_empty))
            .collect()
    }

    /// Nodes with no outbound edges.
    #[must_use]
    pub fn exit_nodes(&self) -> Vec<NodeId> {
        self.node_ids
            .iter()
            .copied()
            .filter(|id| self.outgoing.get(id).is_none_or(Vec::is_empty))
            .collect()
    }

    /// Entry points: nodes with no inbound edge whose handler is a trigger
    /// (`is_trigger` set on the node definition).
    #[must_use]
    pub fn trigger_entry_points(&self) -> Vec<NodeId> {
        self.entry_nodes()
            .into_iter()
            .filter(|id| self.trigger_nodes.contains(id))
            .collect()
    }

    /// A deterministic topological order (Kahn's algorithm), ties broken
    /// by authoring order in `nodes[]`.
    #[must_use]
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> = self
            .node_ids
            .iter()
            .map(|id| (*id, self.dependencies.get(id).map_or(0, Vec::len)))
            .collect();

        // Build the downstream adjacency (by plain node id, ignoring handles)
        // so we can decrement in-degrees as nodes are emitted.
        let mut downstream: HashMap<NodeId, Vec<NodeId>> =
            self.node_ids.iter().map(|id| (*id, Vec::new())).collect();
        for (to, ups) in &self.dependencies {
            for up in ups {
                downstream.entry(*up).or_default().push(*to);
            }
        }

        let mut ready: VecDeque<NodeId> = self
            .node_ids
            .iter()
            .copied()
            .filter(|id| in_degree.get(id).copied().unwrap_or(0) == 0)
            .collect();

        let mut order = Vec::with_capacity(self.node_ids.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            if let Some(downs) = downstream.get(&id) {
                // Authoring-order tie break: scan all nodes in original
                // order, emitting any newly-zero in-degree ones.
                for down in downs {
                    if let Some(deg) = in_degree.get_mut(down) {
                        *deg -= 1;
                    }
                }
            }
            for id2 in &self.node_ids {
                if !order.contains(id2)
                    && !ready.contains(id2)
                    && in_degree.get(id2).copied().unwrap_or(0) == 0
                {
                    ready.push_back(*id2);
                }
            }
        }
        order
    }

    /// Group nodes into parallel levels: level 0 has no dependencies,
    /// level N depends only on nodes in levels `< N`.
    pub fn compute_levels(&self) -> Result<Vec<Vec<NodeId>>, WorkflowError> {
        let order = self.topological_order();
        if order.len() != self.node_ids.len() {
            // Should not happen — from_definition already rejected cycles —
            // but guard against partial orders from disconnected inputs.
            return Err(WorkflowError::CycleDetected(
                self.node_ids
                    .iter()
                    .copied()
                    .filter(|id| !order.contains(id))
                    .collect(),
            ));
        }

        let mut level_of: HashMap<NodeId, usize> = HashMap::new();
        for id in &order {
            let level = self
                .predecessors(*id)
                .iter()
                .map(|p| level_of.get(p).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(*id, level);
        }

        let max_level = level_of.values().copied().max().unwrap_or(0);
        let mut levels: Vec<Vec<NodeId>> = vec![Vec::new(); max_level + 1];
        for id in &order {
            levels[level_of[id]].push(*id);
        }
        Ok(levels)
    }

    /// Any strongly-connected component with more than one member is a
    /// cycle (a lone self-loop also counts, but connections are never
    /// authored from a node to itself in practice).
    fn find_cycle(&self) -> Option<Vec<NodeId>> {
        petgraph::algo::tarjan_scc(&self.inner)
            .into_iter()
            .find(|scc| scc.len() > 1)
            .map(|scc| scc.into_iter().map(|idx| self.inner[idx]).collect())
    }
}

/// The outcome of validating a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Fatal validation problems; non-empty implies `valid == false`.
    pub errors: Vec<String>,
    /// Non-fatal observations (disconnected islands, unused triggers, …).
    pub warnings: Vec<String>,
    /// Nodes with no inbound edge whose handler is a trigger.
    pub entry_points: Vec<NodeId>,
    /// Nodes with no outbound edge.
    pub exit_points: Vec<NodeId>,
    /// A deterministic topological order.
    pub execution_order: Vec<NodeId>,
    /// Immediate upstream dependencies per node.
    pub dependencies: HashMap<NodeId, Vec<NodeId>>,
}

/// Validate a workflow definition, producing a full parse report instead
/// of failing fast. Known node types are not checked here (the Handler
/// Registry lookup happens at the engine layer); callers should pass a
/// set of known type keys to [`parse_with_known_types`] to get the
/// "unknown type" warning.
#[must_use]
pub fn parse(workflow: &WorkflowDefinition) -> ParseResult {
    parse_with_known_types(workflow, None)
}

/// Same as [`parse`], additionally warning about nodes whose `node_type`
/// is not present in `known_types` (the Handler Registry's keys).
#[must_use]
pub fn parse_with_known_types(
    workflow: &WorkflowDefinition,
    known_types: Option<&HashSet<String>>,
) -> ParseResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if workflow.nodes.is_empty() {
        errors.push("workflow has no nodes".to_owned());
        return ParseResult {
            valid: false,
            errors,
            warnings,
            entry_points: Vec::new(),
            exit_points: Vec::new(),
            execution_order: Vec::new(),
            dependencies: HashMap::new(),
        };
    }

    match DependencyGraph::from_definition(workflow) {
        Ok(graph) => {
            if let Some(known) = known_types {
                for node in &workflow.nodes {
                    if !node.node_type.is_empty() && !known.contains(&node.node_type) {
                        warnings.push(format!(
                            "node {} has unknown type '{}'",
                            node.id, node.node_type
                        ));
                    }
                }
            }

            let entry_points = graph.trigger_entry_points();
            if entry_points.is_empty() {
                warnings.push("no trigger entry point found".to_owned());
            }

            // Disconnected islands: nodes unreachable from any entry point.
            let reachable = reachable_from(&graph, &entry_points);
            for id in graph.node_ids() {
                if !reachable.contains(id) {
                    warnings.push(format!("node {id} is disconnected from any entry point"));
                }
            }

            let dependencies = graph
                .node_ids()
                .iter()
                .map(|id| (*id, graph.predecessors(*id).to_vec()))
                .collect();

            ParseResult {
                valid: true,
                errors,
                warnings,
                entry_points,
                exit_points: graph.exit_nodes(),
                execution_order: graph.topological_order(),
                dependencies,
            }
        }
        Err(WorkflowError::CycleDetected(cycle)) => {
            errors.push(format!("Cycle detected: {cycle:?}"));
            ParseResult {
                valid: false,
                errors,
                warnings,
                entry_points: Vec::new(),
                exit_points: Vec::new(),
                execution_order: Vec::new(),
                dependencies: HashMap::new(),
            }
        }
        Err(e) => {
            errors.push(e.to_string());
            ParseResult {
                valid: false,
                errors,
                warnings,
                entry_points: Vec::new(),
                exit_points: Vec::new(),
                execution_order: Vec::new(),
                dependencies: HashMap::new(),
            }
        }
    }
}

fn reachable_from(graph: &DependencyGraph, starts: &[NodeId]) -> HashSet<NodeId> {
    let mut seen: HashSet<NodeId> = starts.iter().copied().collect();
    let mut queue: VecDeque<NodeId> = starts.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for conn in graph.outgoing(id) {
            if seen.insert(conn.to) {
                queue.push_back(conn.to);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{NodeDefinition, WorkflowConfig};
    use chrono::Utc;
    use nebula_core::id::ActionId;
    use nebula_core::Version;
    use std::collections::HashMap as Map;

    fn node(id: NodeId) -> NodeDefinition {
        NodeDefinition::new(id, "n", ActionId::v4())
    }

    fn wf(nodes: Vec<NodeDefinition>, connections: Vec<Connection>) -> WorkflowDefinition {
        let now = Utc::now();
        WorkflowDefinition {
            id: nebula_core::id::WorkflowId::v4(),
            name: "t".into(),
            description: None,
            version: Version::new(0, 1, 0),
            nodes,
            connections,
            variables: Map::new(),
            config: WorkflowConfig::default(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn linear_graph_levels() {
        let (a, b, c) = (NodeId::v4(), NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(a), node(b), node(c)],
            vec![Connection::new(a, b), Connection::new(b, c)],
        );
        let graph = DependencyGraph::from_definition(&w).unwrap();
        assert_eq!(graph.entry_nodes(), vec![a]);
        assert_eq!(graph.exit_nodes(), vec![c]);
        let levels = graph.compute_levels().unwrap();
        assert_eq!(levels, vec![vec![a], vec![b], vec![c]]);
    }

    #[test]
    fn diamond_graph_levels() {
        let (a, b, c, d) = (NodeId::v4(), NodeId::v4(), NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(a), node(b), node(c), node(d)],
            vec![
                Connection::new(a, b),
                Connection::new(a, c),
                Connection::new(b, d),
                Connection::new(c, d),
            ],
        );
        let graph = DependencyGraph::from_definition(&w).unwrap();
        let levels = graph.compute_levels().unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[1].len(), 2);
    }

    #[test]
    fn cycle_is_rejected() {
        let (a, b) = (NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(a), node(b)],
            vec![Connection::new(a, b), Connection::new(b, a)],
        );
        let err = DependencyGraph::from_definition(&w).unwrap_err();
        assert!(matches!(err, WorkflowError::CycleDetected(_)));
    }

    #[test]
    fn unknown_node_reference_rejected() {
        let a = NodeId::v4();
        let ghost = NodeId::v4();
        let w = wf(vec![node(a)], vec![Connection::new(a, ghost)]);
        let err = DependencyGraph::from_definition(&w).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownNode(_)));
    }

    #[test]
    fn empty_workflow_rejected() {
        let w = wf(vec![], vec![]);
        let err = DependencyGraph::from_definition(&w).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyDefinition));
    }

    #[test]
    fn topological_order_respects_insertion_tie_break() {
        // b and c both depend only on a; insertion order b, c should be preserved.
        let (a, b, c) = (NodeId::v4(), NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(a), node(b), node(c)],
            vec![Connection::new(a, b), Connection::new(a, c)],
        );
        let graph = DependencyGraph::from_definition(&w).unwrap();
        let order = graph.topological_order();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn parse_reports_trigger_entry_points() {
        let (t, a) = (NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![
                NodeDefinition::new(t, "trigger", ActionId::v4()).as_trigger(),
                node(a),
            ],
            vec![Connection::new(t, a)],
        );
        let result = parse(&w);
        assert!(result.valid);
        assert_eq!(result.entry_points, vec![t]);
        assert_eq!(result.exit_points, vec![a]);
        assert_eq!(result.execution_order, vec![t, a]);
    }

    #[test]
    fn parse_warns_with_no_trigger() {
        let a = NodeId::v4();
        let w = wf(vec![node(a)], vec![]);
        let result = parse(&w);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("no trigger")));
    }

    #[test]
    fn parse_reports_cycle_error() {
        let (a, b) = (NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(a), node(b)],
            vec![Connection::new(a, b), Connection::new(b, a)],
        );
        let result = parse(&w);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("Cycle detected")));
    }

    #[test]
    fn branch_handle_preserved_in_outgoing() {
        let (s, x, y) = (NodeId::v4(), NodeId::v4(), NodeId::v4());
        let w = wf(
            vec![node(s), node(x), node(y)],
            vec![
                Connection::from_handle(s, "caseFoo", x),
                Connection::from_handle(s, "default", y),
            ],
        );
        let graph = DependencyGraph::from_definition(&w).unwrap();
        let out = graph.outgoing(s);
        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|c| c.source_handle.as_deref() == Some("caseFoo")));
    }
}
