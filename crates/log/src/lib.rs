//! Fast and beautiful logging for the Nebula workflow engine.
//!
//! A thin, opinionated wrapper over `tracing`/`tracing-subscriber`:
//! structured service fields, pluggable writers, runtime filter reload, and
//! an observability hook registry for cross-cutting concerns (metrics,
//! webhooks, Sentry) that don't belong on every `tracing` call site.

mod builder;
pub mod config;
mod core;
mod format;
mod layer;
#[macro_use]
mod macros;
pub mod observability;
mod writer;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

pub use builder::{LoggerBuilder, LoggerGuard, ReloadHandle};
pub use config::{Config, DisplayConfig, Fields, Format, WriterConfig};
pub use core::{LogError, LogResult};
pub use layer::context::Context;

pub use tracing::{debug, error, info, instrument, span, trace, warn};

/// Initialize logging from the environment (`NEBULA_LOG`/`RUST_LOG` and friends).
pub fn auto_init() -> LogResult<LoggerGuard> {
    init_with(Config::from_env())
}

/// Initialize logging with the default configuration.
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize logging with an explicit configuration.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// RAII timer — logs elapsed time on drop. Used by [`timed!`].
pub struct TimerGuard {
    name: &'static str,
    start: Instant,
}

impl TimerGuard {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        tracing::info!(
            operation = self.name,
            elapsed_ms = self.start.elapsed().as_millis(),
            "operation completed"
        );
    }
}

/// Future returned by [`Timed::timed`] — logs elapsed time once `inner` resolves.
#[pin_project::pin_project]
pub struct TimedFuture<F> {
    #[pin]
    inner: F,
    name: &'static str,
    start: Instant,
}

impl<F: Future> Future for TimedFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.inner.poll(cx) {
            Poll::Ready(output) => {
                tracing::info!(
                    operation = *this.name,
                    elapsed_ms = this.start.elapsed().as_millis(),
                    "operation completed"
                );
                Poll::Ready(output)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Extension trait: `future.timed("name").await` logs elapsed time on completion.
pub trait Timed: Future + Sized {
    fn timed(self, name: &'static str) -> TimedFuture<Self> {
        TimedFuture {
            inner: self,
            name,
            start: Instant::now(),
        }
    }
}

impl<F: Future> Timed for F {}

/// Convenience re-exports for `use nebula_log::prelude::*`.
pub mod prelude {
    pub use super::{Timed, debug, error, info, instrument, trace, warn};
}
