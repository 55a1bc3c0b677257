//! Pluggable observability hook registry.
//!
//! Hooks observe [`ObservabilityEvent`]s emitted anywhere in the process via
//! [`emit_event`]. Dispatch is synchronous and panic-isolated — a panicking
//! hook is caught and logged, not propagated to the emitting call site.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, LazyLock, RwLock};

use super::context::NodeContext;

pub trait ObservabilityEvent: Send + Sync {
    fn name(&self) -> &str;

    fn data(&self) -> Option<serde_json::Value> {
        None
    }
}

pub trait ObservabilityHook: Send + Sync {
    fn on_event(&self, event: &dyn ObservabilityEvent);

    fn initialize(&self) {}

    fn shutdown(&self) {}
}

/// A hook that additionally wants the active [`NodeContext`], if any.
pub trait ResourceAwareHook: Send + Sync {
    fn on_event_with_context(&self, event: &dyn ObservabilityEvent, ctx: Option<Arc<NodeContext>>);
}

/// Bridges a [`ResourceAwareHook`] into the plain [`ObservabilityHook`] registry.
pub struct ResourceAwareAdapter<H> {
    inner: H,
}

impl<H: ResourceAwareHook> ResourceAwareAdapter<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: ResourceAwareHook> ObservabilityHook for ResourceAwareAdapter<H> {
    fn on_event(&self, event: &dyn ObservabilityEvent) {
        self.inner
            .on_event_with_context(event, NodeContext::current());
    }
}

/// Forwards events to `tracing` at a fixed level.
pub struct LoggingHook {
    level: tracing::Level,
}

impl LoggingHook {
    #[must_use]
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl ObservabilityHook for LoggingHook {
    fn on_event(&self, event: &dyn ObservabilityEvent) {
        let data = event.data();
        match self.level {
            tracing::Level::TRACE => tracing::trace!(event = event.name(), ?data),
            tracing::Level::DEBUG => tracing::debug!(event = event.name(), ?data),
            tracing::Level::INFO => tracing::info!(event = event.name(), ?data),
            tracing::Level::WARN => tracing::warn!(event = event.name(), ?data),
            tracing::Level::ERROR => tracing::error!(event = event.name(), ?data),
        }
    }
}

/// Counts events. Gated behind the `observability` feature since it's the
/// natural seam for wiring in an actual metrics exporter.
#[cfg(feature = "observability")]
pub struct MetricsHook {
    event_count: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "observability")]
impl MetricsHook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_count: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn count(&self) -> u64 {
        self.event_count.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(feature = "observability")]
impl Default for MetricsHook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "observability")]
impl ObservabilityHook for MetricsHook {
    fn on_event(&self, _event: &dyn ObservabilityEvent) {
        self.event_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Matches events by name prefix.
pub struct EventFilter {
    prefix: String,
}

impl EventFilter {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, event: &dyn ObservabilityEvent) -> bool {
        event.name().starts_with(&self.prefix)
    }
}

static HOOKS: LazyLock<RwLock<Vec<Arc<dyn ObservabilityHook>>>> =
    LazyLock::new(|| RwLock::new(Vec::new()));

/// Register a hook. Its `initialize()` runs immediately.
pub fn register_hook(hook: Arc<dyn ObservabilityHook>) {
    hook.initialize();
    HOOKS.write().unwrap_or_else(|e| e.into_inner()).push(hook);
}

/// Dispatch an event to every registered hook.
pub fn emit_event(event: &dyn ObservabilityEvent) {
    let hooks = HOOKS.read().unwrap_or_else(|e| e.into_inner());
    for hook in hooks.iter() {
        let hook = Arc::clone(hook);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook.on_event(event))) {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(hook_panic = %message, "observability hook panicked");
        }
    }
}

/// Shut down and clear every registered hook.
pub fn shutdown_hooks() {
    let mut hooks = HOOKS.write().unwrap_or_else(|e| e.into_inner());
    for hook in hooks.iter() {
        hook.shutdown();
    }
    hooks.clear();
}
