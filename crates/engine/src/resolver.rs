//! Parameter resolution — resolves `ParamValue`s into concrete JSON values.
//!
//! Each node in a workflow can have parameters of type [`ParamValue`]:
//! - `Literal` — static JSON, used as-is
//! - `Expression` — evaluated via [`ExpressionEngine`]
//! - `Template` — parsed and rendered via [`ExpressionEngine`]
//! - `Reference` — looked up from a predecessor node's output

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use nebula_core::id::NodeId;
use nebula_expression::{EvaluationContext, ExpressionEngine};
use nebula_workflow::ParamValue;

use crate::error::EngineError;

/// Resolves node parameters into concrete JSON values.
pub(crate) struct ParamResolver {
    expression_engine: Arc<ExpressionEngine>,
    /// Allow-listed snapshot of process environment variables, exposed to
    /// node parameters as `$env.*`. Snapshotted once at resolver
    /// construction, not read live, so resolution stays pure.
    env: HashMap<String, String>,
}

impl ParamResolver {
    /// Create a new resolver backed by the given expression engine and
    /// environment snapshot.
    pub(crate) fn new(expression_engine: Arc<ExpressionEngine>, env: HashMap<String, String>) -> Self {
        Self {
            expression_engine,
            env,
        }
    }

    /// Resolve all parameters for a node, producing a JSON object.
    ///
    /// If the node has no parameters, returns `None` (caller uses
    /// predecessor output as-is for backward compatibility).
    pub(crate) fn resolve(
        &self,
        node_id: NodeId,
        params: &HashMap<String, ParamValue>,
        node_input: &serde_json::Value,
        trigger_input: &serde_json::Value,
        outputs: &DashMap<NodeId, serde_json::Value>,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        if params.is_empty() {
            return Ok(None);
        }

        // Build expression context: $json is this node's resolved input,
        // $trigger is the execution's original input, $node("id").output
        // is populated from every predecessor output produced so far.
        let mut ctx = EvaluationContext::new();
        ctx.set_json(node_input.clone());
        ctx.set_trigger(trigger_input.clone());
        ctx.set_env(self.env.clone());

        for entry in outputs.iter() {
            ctx.set_node_output(entry.key().to_string(), entry.value().clone());
        }

        // Resolve each parameter
        let mut resolved = serde_json::Map::new();
        for (key, param_value) in params {
            let value = self.resolve_param(node_id, key, param_value, &ctx, outputs)?;
            resolved.insert(key.clone(), value);
        }

        Ok(Some(serde_json::Value::Object(resolved)))
    }

    /// Resolve a single parameter value.
    fn resolve_param(
        &self,
        node_id: NodeId,
        key: &str,
        param: &ParamValue,
        ctx: &EvaluationContext,
        outputs: &DashMap<NodeId, serde_json::Value>,
    ) -> Result<serde_json::Value, EngineError> {
        match param {
            ParamValue::Literal { value } => Ok(value.clone()),

            ParamValue::Expression { expr } => {
                self.expression_engine.evaluate(expr, ctx).map_err(|e| {
                    EngineError::ParameterResolution {
                        node_id,
                        param_key: key.to_owned(),
                        error: e.to_string(),
                    }
                })
            }

            ParamValue::Template { template } => {
                let tmpl = self
                    .expression_engine
                    .parse_template(template)
                    .map_err(|e| EngineError::ParameterResolution {
                        node_id,
                        param_key: key.to_owned(),
                        error: format!("template parse error: {e}"),
                    })?;
                let rendered = self
                    .expression_engine
                    .render_template(&tmpl, ctx)
                    .map_err(|e| EngineError::ParameterResolution {
                        node_id,
                        param_key: key.to_owned(),
                        error: format!("template render error: {e}"),
                    })?;
                Ok(serde_json::Value::String(rendered))
            }

            ParamValue::Reference {
                node_id: ref_node,
                output_path,
            } => {
                let output =
                    outputs
                        .get(ref_node)
                        .ok_or_else(|| EngineError::ParameterResolution {
                            node_id,
                            param_key: key.to_owned(),
                            error: format!("referenced node {} has no output", ref_node),
                        })?;
                let value = navigate_path(output.value(), output_path);
                Ok(value)
            }
        }
    }
}

/// Navigate a JSON value by a dot-separated path.
///
/// Supports object key access and array index access:
/// - `"data.items"` → `value["data"]["items"]`
/// - `"items.0.name"` → `value["items"][0]["name"]`
///
/// Returns `Value::Null` for missing keys or out-of-bounds indices.
fn navigate_path(value: &serde_json::Value, path: &str) -> serde_json::Value {
    if path.is_empty() {
        return value.clone();
    }
    let mut current = value;
    for segment in path.split('.') {
        match current {
            serde_json::Value::Object(map) => {
                current = map.get(segment).unwrap_or(&serde_json::Value::Null);
            }
            serde_json::Value::Array(arr) => {
                if let Ok(idx) = segment.parse::<usize>() {
                    current = arr.get(idx).unwrap_or(&serde_json::Value::Null);
                } else {
                    return serde_json::Value::Null;
                }
            }
            _ => return serde_json::Value::Null,
        }
    }
    current.clone()
}
