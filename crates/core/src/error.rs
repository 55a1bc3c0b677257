//! Core-level error type shared by the foundational id/scope machinery.

use thiserror::Error;

/// Errors produced by `nebula-core` itself (id parsing, key normalization).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A UUID-based identifier failed to parse.
    #[error("invalid id: {0}")]
    InvalidId(#[from] domain_key::UuidParseError),

    /// A normalized key failed to parse or validate.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] domain_key::KeyParseError),

    /// A scope constraint was violated (e.g. narrower-than-required scope).
    #[error("scope violation: {0}")]
    ScopeViolation(String),
}
