//! Template parsing: splits a string on `{{ ... }}` delimiters into
//! literal and expression segments, so a template can be parsed once and
//! rendered many times against different contexts.

use serde_json::Value;

use crate::engine::{eval_path_expr, stringify};
use crate::{EvaluationContext, ExpressionError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expr(String),
}

/// A parsed template, ready to render against an [`EvaluationContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parse a template string, splitting on `{{` / `}}` delimiters.
    ///
    /// # Errors
    /// Returns [`ExpressionError::UnterminatedDelimiter`] if a `{{` is
    /// never closed.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let mut parts = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let Some(close) = after_open.find("}}") else {
                return Err(ExpressionError::UnterminatedDelimiter(source.to_string()));
            };
            parts.push(Part::Expr(after_open[..close].trim().to_string()));
            rest = &after_open[close + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self { parts })
    }

    /// `true` if this template is exactly one `{{ expr }}` with no
    /// surrounding literal text — in that case the substitution keeps its
    /// native JSON type instead of being stringified.
    #[must_use]
    pub fn is_single_expression(&self) -> bool {
        matches!(self.parts.as_slice(), [Part::Expr(_)])
    }

    /// Render against `ctx`, returning the native JSON value when this
    /// template is a single bare expression, or a `Value::String` built
    /// from concatenating literal text with stringified expression
    /// results otherwise.
    pub fn render_value(&self, ctx: &EvaluationContext) -> Result<Value, ExpressionError> {
        if let [Part::Expr(expr)] = self.parts.as_slice() {
            return eval_path_expr(expr, ctx);
        }

        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expr(expr) => out.push_str(&stringify(&eval_path_expr(expr, ctx)?)),
            }
        }
        Ok(Value::String(out))
    }

    /// Render against `ctx`, always returning a `String` (stringifying a
    /// single-expression template's native result if needed).
    pub fn render(&self, ctx: &EvaluationContext) -> Result<String, ExpressionError> {
        Ok(match self.render_value(ctx)? {
            Value::String(s) => s,
            other => stringify(&other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with_json(value: Value) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        ctx.set_json(value);
        ctx
    }

    #[test]
    fn plain_literal_has_no_expressions() {
        let tmpl = Template::parse("hello world").unwrap();
        assert!(!tmpl.is_single_expression());
        let ctx = EvaluationContext::new();
        assert_eq!(tmpl.render(&ctx).unwrap(), "hello world");
    }

    #[test]
    fn single_expression_keeps_native_type() {
        let tmpl = Template::parse("{{ $json.count }}").unwrap();
        assert!(tmpl.is_single_expression());
        let ctx = ctx_with_json(json!({"count": 5}));
        assert_eq!(tmpl.render_value(&ctx).unwrap(), json!(5));
    }

    #[test]
    fn mixed_template_stringifies_expressions() {
        let tmpl = Template::parse("Hello {{ $json.name }}!").unwrap();
        assert!(!tmpl.is_single_expression());
        let ctx = ctx_with_json(json!({"name": "World"}));
        assert_eq!(tmpl.render(&ctx).unwrap(), "Hello World!");
    }

    #[test]
    fn missing_path_renders_empty_string() {
        let tmpl = Template::parse("value=[{{ $json.missing }}]").unwrap();
        let ctx = ctx_with_json(json!({}));
        assert_eq!(tmpl.render(&ctx).unwrap(), "value=[]");
    }

    #[test]
    fn unterminated_delimiter_errors() {
        let err = Template::parse("Hello {{ unclosed").unwrap_err();
        assert!(matches!(err, ExpressionError::UnterminatedDelimiter(_)));
    }

    #[test]
    fn multiple_expressions_concatenate() {
        let tmpl = Template::parse("{{ $json.a }}-{{ $json.b }}").unwrap();
        let ctx = ctx_with_json(json!({"a": 1, "b": 2}));
        assert_eq!(tmpl.render(&ctx).unwrap(), "1-2");
    }

    #[test]
    fn non_template_string_is_identity() {
        let tmpl = Template::parse("https://example.com").unwrap();
        let ctx = EvaluationContext::new();
        assert_eq!(
            tmpl.render_value(&ctx).unwrap(),
            json!("https://example.com")
        );
    }
}
