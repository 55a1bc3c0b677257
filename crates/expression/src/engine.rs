//! Expression parsing and evaluation for the four namespaces:
//! `$json`, `$node("id").output`, `$trigger`, `$env`.

use serde_json::Value;

use crate::path::navigate;
use crate::template::Template;
use crate::{EvaluationContext, ExpressionError};

/// Strip a single layer of matching `'...'` or `"..."` quotes, if present.
fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Evaluate a single bare expression (no `{{ }}` delimiters) against `ctx`.
pub(crate) fn eval_path_expr(expr: &str, ctx: &EvaluationContext) -> Result<Value, ExpressionError> {
    let expr = expr.trim();

    if let Some(rest) = expr.strip_prefix("$node(") {
        let close = rest
            .find(')')
            .ok_or_else(|| ExpressionError::MalformedNodeReference(expr.to_string()))?;
        let id = unquote(rest[..close].trim());
        if id.is_empty() {
            return Err(ExpressionError::MalformedNodeReference(expr.to_string()));
        }

        let after = rest[close + 1..].trim();
        let after = after.strip_prefix('.').unwrap_or(after);
        let path = match after {
            "" => "",
            "output" => "",
            _ if after.starts_with("output.") => &after["output.".len()..],
            _ => return Err(ExpressionError::MalformedNodeReference(expr.to_string())),
        };

        return Ok(match ctx.node_output(id) {
            Some(output) => navigate(output, path),
            None => Value::Null,
        });
    }

    if let Some(rest) = expr.strip_prefix("$json") {
        let path = rest.strip_prefix('.').unwrap_or(rest);
        return Ok(navigate(ctx.json(), path));
    }

    if let Some(rest) = expr.strip_prefix("$trigger") {
        let path = rest.strip_prefix('.').unwrap_or(rest);
        return Ok(navigate(ctx.trigger(), path));
    }

    if let Some(var) = expr.strip_prefix("$env.") {
        return Ok(match ctx.env_var(var.trim()) {
            Some(value) => Value::String(value.to_string()),
            None => Value::Null,
        });
    }

    Err(ExpressionError::UnrecognizedExpression(expr.to_string()))
}

/// Render a bare expression's result as text for substitution into a
/// mixed (non-single-expression) template: `Value::Null` becomes an
/// empty string, `Value::String` is used unquoted, everything else is
/// its JSON form.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluates expressions and templates against an [`EvaluationContext`].
///
/// Stateless — constructing one is cheap and `Clone`/`Copy`-free usage
/// across threads is fine since there's no interior state to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEngine;

impl ExpressionEngine {
    /// Construct a new engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a single bare expression, e.g. `"$json.order.id"`. The
    /// string must not contain `{{ }}` delimiters — use
    /// [`Self::render_template_value`] for full templates.
    pub fn evaluate(&self, expr: &str, ctx: &EvaluationContext) -> Result<Value, ExpressionError> {
        eval_path_expr(expr, ctx)
    }

    /// Parse a template string containing zero or more `{{ expr }}`
    /// spans.
    pub fn parse_template(&self, template: &str) -> Result<Template, ExpressionError> {
        Template::parse(template)
    }

    /// Render a parsed template to a native [`Value`] (keeping the
    /// expression's own type when the template is a single bare
    /// expression, otherwise a `Value::String`).
    pub fn render_template_value(
        &self,
        template: &Template,
        ctx: &EvaluationContext,
    ) -> Result<Value, ExpressionError> {
        template.render_value(ctx)
    }

    /// Render a parsed template to a `String`.
    pub fn render_template(
        &self,
        template: &Template,
        ctx: &EvaluationContext,
    ) -> Result<String, ExpressionError> {
        template.render(ctx)
    }

    /// Parse and render a template string in one step, keeping the
    /// native JSON type for single-expression templates.
    pub fn render(&self, template: &str, ctx: &EvaluationContext) -> Result<Value, ExpressionError> {
        Template::parse(template)?.render_value(ctx)
    }

    /// Recursively substitute templates found in every string leaf of
    /// `value`, leaving numbers, booleans, `null`, and structure
    /// untouched. Used to resolve a node's entire parameter map in one
    /// pass.
    pub fn substitute_recursive(
        &self,
        value: &Value,
        ctx: &EvaluationContext,
    ) -> Result<Value, ExpressionError> {
        match value {
            Value::String(s) => self.render(s, ctx),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.substitute_recursive(item, ctx)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, val) in map {
                    out.insert(key.clone(), self.substitute_recursive(val, ctx)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }
}
