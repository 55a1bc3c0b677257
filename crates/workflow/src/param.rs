//! Node parameter values — literal, expression, template, or a reference
//! to a predecessor's output.

use nebula_core::id::NodeId;
use serde::{Deserialize, Serialize};

/// A single configuration value on a node, before expression resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    /// Used as-is, no resolution needed.
    Literal {
        /// The static value.
        value: serde_json::Value,
    },
    /// A `$json`/`$node`/`$trigger`/`$env` expression, evaluated and
    /// substituted in native JSON form.
    Expression {
        /// The raw expression source (without `{{ }}` delimiters).
        expr: String,
    },
    /// A string possibly containing one or more `{{ ... }}` expressions,
    /// rendered by stringified interpolation.
    Template {
        /// The raw template source.
        template: String,
    },
    /// A direct reference to a predecessor node's output, navigated by a
    /// dot-separated path.
    Reference {
        /// The upstream node whose output is referenced.
        node_id: NodeId,
        /// Dot-separated path into that node's output (empty = whole value).
        output_path: String,
    },
}

impl ParamValue {
    /// Build a literal value parameter.
    pub fn literal(value: serde_json::Value) -> Self {
        Self::Literal { value }
    }

    /// Build an expression parameter.
    pub fn expression(expr: impl Into<String>) -> Self {
        Self::Expression { expr: expr.into() }
    }

    /// Build a template parameter.
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
        }
    }

    /// Build a reference parameter.
    pub fn reference(node_id: NodeId, output_path: impl Into<String>) -> Self {
        Self::Reference {
            node_id,
            output_path: output_path.into(),
        }
    }
}
