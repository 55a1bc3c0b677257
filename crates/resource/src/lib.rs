#![allow(clippy::excessive_nesting)]

//! # Nebula Resource Management
//!
//! Resource lifecycle management for the Nebula workflow engine.
//! Provides pooling, scoping, health checks, hooks, auto-scaling, and
//! observability for resources (database clients, HTTP clients, message
//! queue connections, ...) used within workflows and actions.

pub mod autoscale;
pub mod context;
#[cfg(feature = "credentials")]
pub mod credentials;
pub mod error;
pub mod events;
pub mod guard;
pub mod handle;
pub mod health;
pub mod hooks;
pub mod manager;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod pool;
pub mod quarantine;
pub mod resource;
pub mod scope;

// Re-exports
pub use autoscale::{AutoScalePolicy, AutoScaler};
pub use context::Context;
#[cfg(feature = "credentials")]
pub use credentials::CredentialProvider;
pub use error::{Error, Result};
pub use events::{CleanupReason, EventBus, ResourceEvent};
pub use guard::Guard;
pub use handle::ResourceHandle;
pub use health::{HealthCheckConfig, HealthCheckable, HealthChecker, HealthState, HealthStatus};
pub use hooks::{HookEvent, HookFilter, HookRegistry, HookResult, ResourceHook};
pub use manager::{AnyGuard, AnyGuardTrait, DependencyGraph, Manager};
#[cfg(feature = "metrics")]
pub use metrics::{MetricsCollector, spawn_metrics_collector};
pub use pool::{Pool, PoolConfig, PoolStats};
pub use quarantine::{
    QuarantineConfig, QuarantineEntry, QuarantineManager, QuarantineReason, RecoveryStrategy,
};
pub use resource::{Config, Resource};
pub use scope::{Scope, Strategy};

/// Common imports for implementing and using a [`Resource`].
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::events::{CleanupReason, EventBus, ResourceEvent};
    pub use crate::guard::Guard;
    pub use crate::handle::ResourceHandle;
    pub use crate::health::{HealthCheckable, HealthState, HealthStatus};
    pub use crate::manager::{AnyGuard, Manager};
    pub use crate::pool::{Pool, PoolConfig, PoolStats};
    pub use crate::resource::{Config, Resource};
    pub use crate::scope::{Scope, Strategy};
}
