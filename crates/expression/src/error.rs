//! Error type for expression parsing and template rendering.

/// Errors raised while parsing or rendering expressions/templates.
///
/// A path that simply doesn't resolve is *not* an error — it resolves to
/// an empty string. These variants only cover
/// genuine syntax problems: an unterminated `{{ ... }}` delimiter or a
/// root namespace the grammar doesn't recognize.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExpressionError {
    /// A `{{` was never closed by a matching `}}`.
    #[error("unterminated expression delimiter in template: {0:?}")]
    UnterminatedDelimiter(String),

    /// The expression's root namespace wasn't one of `$json`, `$node`,
    /// `$trigger`, or `$env`.
    #[error("unrecognized expression: {0:?}")]
    UnrecognizedExpression(String),

    /// `$node(...)` was missing its closing parenthesis or quoted id.
    #[error("malformed $node() reference: {0:?}")]
    MalformedNodeReference(String),
}
