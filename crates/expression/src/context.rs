//! Evaluation context: the four namespaces expressions resolve against.

use std::collections::HashMap;

use serde_json::Value;

/// Resolution context for one expression/template evaluation.
///
/// Carries the four namespaces the grammar exposes:
/// - `$json` — the current node's input (set via [`Self::set_json`]).
/// - `$node("id").output` — a completed upstream node's output (set via
///   [`Self::set_node_output`]).
/// - `$trigger` — the execution's original trigger input.
/// - `$env` — an allow-listed snapshot of process environment variables,
///   supplied up front rather than read live so evaluation stays pure and
///   testable.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    json: Value,
    node_outputs: HashMap<String, Value>,
    trigger: Value,
    env: HashMap<String, String>,
}

impl EvaluationContext {
    /// An empty context: every path resolves to an empty string.
    #[must_use]
    pub fn new() -> Self {
        Self {
            json: Value::Null,
            node_outputs: HashMap::new(),
            trigger: Value::Null,
            env: HashMap::new(),
        }
    }

    /// Set the current node's input (`$json`).
    pub fn set_json(&mut self, value: Value) {
        self.json = value;
    }

    /// Record a completed upstream node's output, addressable as
    /// `$node("node_id").output`.
    pub fn set_node_output(&mut self, node_id: impl Into<String>, output: Value) {
        self.node_outputs.insert(node_id.into(), output);
    }

    /// Set the execution's original trigger input (`$trigger`).
    pub fn set_trigger(&mut self, value: Value) {
        self.trigger = value;
    }

    /// Install the allow-listed environment snapshot (`$env`).
    pub fn set_env(&mut self, env: HashMap<String, String>) {
        self.env = env;
    }

    pub(crate) fn json(&self) -> &Value {
        &self.json
    }

    pub(crate) fn trigger(&self) -> &Value {
        &self.trigger
    }

    pub(crate) fn node_output(&self, node_id: &str) -> Option<&Value> {
        self.node_outputs.get(node_id)
    }

    pub(crate) fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}
