//! Errors produced while resolving a credential.

use thiserror::Error;

/// Failure modes for [`crate::CredentialResolver`].
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential is registered under this id.
    #[error("credential {0} not found")]
    NotFound(String),
    /// The credential exists, but `user_id` is not permitted to use it.
    #[error("user {user_id} is not permitted to access credential {credential_id}")]
    AccessDenied {
        credential_id: String,
        user_id: String,
    },
}
