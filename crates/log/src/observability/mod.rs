//! Multi-level context propagation, resource-scoped logging config, and a
//! pluggable hook registry for cross-cutting observability concerns that
//! don't belong on every `tracing` call site.

pub mod context;
pub mod events;
mod hooks;
mod resources;
mod span;

pub use context::{
    ContextSnapshot, ExecutionContext, GlobalContext, NodeContext, ResourceMap, current_contexts,
};
pub use events::{OperationCompleted, OperationFailed, OperationStarted, OperationTracker};
pub use hooks::{
    EventFilter, LoggingHook, ObservabilityEvent, ObservabilityHook, ResourceAwareAdapter,
    ResourceAwareHook, emit_event, register_hook, shutdown_hooks,
};
#[cfg(feature = "observability")]
pub use hooks::MetricsHook;
pub use resources::{LogLevel, LoggerResource, NotificationPrefs, NotificationSeverity};
pub use span::get_current_logger_resource;
