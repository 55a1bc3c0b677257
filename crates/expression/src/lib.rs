//! Expression and template evaluation over workflow execution data.
//!
//! Implements the path-expression grammar used to resolve node
//! parameters: `$json.path`, `$node("id").output.path`, `$trigger.path`,
//! and `$env.VAR`, embedded in `{{ ... }}` template spans. A path that
//! doesn't resolve evaluates to an empty value rather than failing —
//! only malformed syntax is an error.

mod context;
mod engine;
mod error;
mod path;
mod template;

pub use context::EvaluationContext;
pub use engine::ExpressionEngine;
pub use error::ExpressionError;
pub use template::Template;
