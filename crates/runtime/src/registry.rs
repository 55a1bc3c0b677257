//! Action registry for looking up handlers by key.

use std::sync::Arc;

use dashmap::DashMap;

use nebula_action::handler::InternalHandler;

use crate::error::RuntimeError;

/// Thread-safe registry of action handlers.
///
/// Actions are registered by key (e.g. `"http.request"`) and looked up
/// at execution time. Uses `DashMap` for lock-free concurrent access.
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_runtime::registry::ActionRegistry;
///
/// let registry = ActionRegistry::new();
/// registry.register(Arc::new(my_handler));
/// let handler = registry.get("http.request").unwrap();
/// ```
pub struct ActionRegistry {
    handlers: DashMap<String, Arc<dyn InternalHandler>>,
}

impl ActionRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register an action handler.
    ///
    /// If a handler with the same key already exists, it is replaced.
    pub fn register(&self, handler: Arc<dyn InternalHandler>) {
        let key = handler.metadata().key.clone();
        tracing::info!(action_key = %key, "registered action handler");
        self.handlers.insert(key, handler);
    }

    /// Register a typed [`ProcessAction`](nebula_action::ProcessAction) directly.
    ///
    /// Wraps the action in a [`ProcessActionAdapter`](nebula_action::ProcessActionAdapter)
    /// automatically.
    pub fn register_process<A>(&self, action: A)
    where
        A: nebula_action::ProcessAction + Send + Sync + 'static,
        A::Input: serde::de::DeserializeOwned + Send + Sync + 'static,
        A::Output: serde::Serialize + Send + Sync + 'static,
    {
        let adapter = nebula_action::ProcessActionAdapter::new(action);
        self.register(Arc::new(adapter));
    }

    /// Look up an action handler by key.
    pub fn get(&self, key: &str) -> Result<Arc<dyn InternalHandler>, RuntimeError> {
        self.handlers
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RuntimeError::ActionNotFound {
                key: key.to_owned(),
            })
    }

    /// Check if a handler is registered for the given key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Remove a handler by key. Returns the removed handler, if any.
    pub fn remove(&self, key: &str) -> Option<Arc<dyn InternalHandler>> {
        self.handlers.remove(key).map(|(_, v)| v)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// List all registered action keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
