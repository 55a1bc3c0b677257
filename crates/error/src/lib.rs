//! Shared error taxonomy for the Nebula workflow engine.
//!
//! Every crate defines its own `thiserror` error enum for its own concerns,
//! but classifies each variant into one of a small set of coarse kinds via
//! the [`ErrorKind`] enum and the [`NebulaError`] trait. This lets the
//! `apps/cli` boundary (and any future transport) answer "what kind of
//! error is this" without matching on every crate's concrete error type.

#[cfg(feature = "derive")]
pub use nebula_error_macros::NebulaError;

/// Coarse error classification shared across every engine crate.
///
/// This is deliberately NOT a
/// replacement for per-crate error enums — it is a classification layer on
/// top of them, used at API/CLI boundaries to decide status codes, retry
/// behavior, and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Graph invalid, unknown node type at schedule time, missing config.
    Validation,
    /// Execution/approval/form/trigger id absent.
    NotFound,
    /// Caller lacks access to flow or credential.
    PermissionDenied,
    /// Operation illegal in current state (cancel-on-completed, etc.).
    StateConflict,
    /// A handler returned `Failure` or threw.
    NodeExecutionFailure,
    /// A handler exceeded its soft timeout.
    NodeTimeout,
    /// Persistence/network blip within scheduler plumbing.
    Transient,
    /// Approval/form expired; resume refused.
    Expired,
}

impl ErrorKind {
    /// Returns `true` for kinds the caller may reasonably retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::StateConflict => "state_conflict",
            Self::NodeExecutionFailure => "node_execution_failure",
            Self::NodeTimeout => "node_timeout",
            Self::Transient => "transient",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Implemented by every crate-level error enum so call sites can classify
/// an error without downcasting to the concrete type.
pub trait NebulaError: std::error::Error {
    /// This error's taxonomy kind.
    fn kind(&self) -> ErrorKind;

    /// A short, user-facing reason string. Never a stack trace — only the
    /// kind and a short reason.
    fn user_message(&self) -> String {
        format!("{}: {self}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("widget {0} not found")]
    struct WidgetNotFound(String);

    impl NebulaError for WidgetNotFound {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NotFound
        }
    }

    #[test]
    fn user_message_carries_kind_and_reason() {
        let err = WidgetNotFound("w1".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "not_found: widget w1 not found");
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::NodeTimeout.is_retryable());
    }

    #[test]
    fn display_matches_snake_case() {
        assert_eq!(ErrorKind::NodeExecutionFailure.to_string(), "node_execution_failure");
        assert_eq!(ErrorKind::PermissionDenied.to_string(), "permission_denied");
    }
}
