//! Persistence-layer error type.

use thiserror::Error;

/// Errors surfaced by repository implementations.
///
/// The in-memory reference implementation only ever raises [`Self::NotFound`];
/// the other variants exist for the trait contract any real backend
/// (Postgres, SQLite, a KV store) would need to honor.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No record exists for the given key.
    #[error("not found")]
    NotFound,
    /// The write conflicted with an existing record (e.g. duplicate key).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backend itself failed (connection, serialization, etc.).
    #[error("backend error: {0}")]
    Backend(String),
}
