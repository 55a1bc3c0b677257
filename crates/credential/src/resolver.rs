//! The `CredentialResolver` port.
//!
//! Resolving a node's configured credential id to a decrypted secret map
//! is the only contract this crate defines -- at-rest storage, encryption,
//! and rotation are out of scope; a production deployment plugs in its own
//! [`CredentialResolver`] backed by a vault or secrets manager.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CredentialError;

/// A resolved credential's fields, keyed by field name (e.g. `"apiKey"`,
/// `"password"`).
pub type SecretMap = HashMap<String, String>;

/// Resolves a workflow-authored credential id to its secrets, scoped to
/// the user on whose behalf the workflow is executing.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve `credential_id`'s secret map on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// [`CredentialError::NotFound`] if no such credential is registered,
    /// [`CredentialError::AccessDenied`] if `user_id` may not use it.
    async fn resolve(&self, credential_id: &str, user_id: &str) -> Result<SecretMap, CredentialError>;

    /// Check whether `user_id` may access `credential_id`, without
    /// resolving its secrets.
    ///
    /// # Errors
    ///
    /// [`CredentialError::NotFound`] if no such credential is registered.
    async fn can_access(&self, credential_id: &str, user_id: &str) -> Result<bool, CredentialError>;
}

/// An in-memory [`CredentialResolver`]: every credential is owned by
/// exactly one user, the only principal granted access to it.
#[derive(Debug, Default)]
pub struct InMemoryCredentialResolver {
    credentials: DashMap<String, (String, SecretMap)>,
}

impl InMemoryCredentialResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            credentials: DashMap::new(),
        }
    }

    /// Register a credential's secrets under `credential_id`, owned by
    /// `owner_id`. Overwrites any existing registration.
    pub fn insert(
        &self,
        credential_id: impl Into<String>,
        owner_id: impl Into<String>,
        secrets: SecretMap,
    ) {
        self.credentials
            .insert(credential_id.into(), (owner_id.into(), secrets));
    }
}

#[async_trait]
impl CredentialResolver for InMemoryCredentialResolver {
    async fn resolve(&self, credential_id: &str, user_id: &str) -> Result<SecretMap, CredentialError> {
        let entry = self
            .credentials
            .get(credential_id)
            .ok_or_else(|| CredentialError::NotFound(credential_id.to_owned()))?;
        let (owner_id, secrets) = entry.value();
        if owner_id != user_id {
            return Err(CredentialError::AccessDenied {
                credential_id: credential_id.to_owned(),
                user_id: user_id.to_owned(),
            });
        }
        Ok(secrets.clone())
    }

    async fn can_access(&self, credential_id: &str, user_id: &str) -> Result<bool, CredentialError> {
        let entry = self
            .credentials
            .get(credential_id)
            .ok_or_else(|| CredentialError::NotFound(credential_id.to_owned()))?;
        Ok(entry.value().0 == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> SecretMap {
        let mut map = HashMap::new();
        map.insert("apiKey".to_owned(), "sk-test-123".to_owned());
        map
    }

    #[tokio::test]
    async fn owner_resolves_their_own_credential() {
        let resolver = InMemoryCredentialResolver::new();
        resolver.insert("cred-1", "user-a", secrets());

        let resolved = resolver.resolve("cred-1", "user-a").await.unwrap();
        assert_eq!(resolved.get("apiKey"), Some(&"sk-test-123".to_owned()));
    }

    #[tokio::test]
    async fn non_owner_is_denied() {
        let resolver = InMemoryCredentialResolver::new();
        resolver.insert("cred-1", "user-a", secrets());

        let err = resolver.resolve("cred-1", "user-b").await.unwrap_err();
        assert!(matches!(err, CredentialError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn unknown_credential_is_not_found() {
        let resolver = InMemoryCredentialResolver::new();
        let err = resolver.resolve("missing", "user-a").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));
    }

    #[tokio::test]
    async fn can_access_reflects_ownership() {
        let resolver = InMemoryCredentialResolver::new();
        resolver.insert("cred-1", "user-a", secrets());

        assert!(resolver.can_access("cred-1", "user-a").await.unwrap());
        assert!(!resolver.can_access("cred-1", "user-b").await.unwrap());
    }

    #[tokio::test]
    async fn can_access_unknown_credential_is_not_found() {
        let resolver = InMemoryCredentialResolver::new();
        let err = resolver.can_access("missing", "user-a").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));
    }
}
