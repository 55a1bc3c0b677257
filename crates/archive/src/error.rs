//! Archival service errors.

use nebula_persistence::PersistenceError;
use thiserror::Error;

/// Errors raised by [`crate::ArchiveService`].
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The underlying repository failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}
