#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Metrics
//!
//! Canonical metric names shared across the workspace (see [`names`]), and
//! an optional Prometheus export adapter behind the `prometheus` feature.
//!
//! Every crate still records through
//! [`nebula_telemetry::metrics::MetricsRegistry`] by default — this crate
//! does not introduce a second mandatory metrics backend. It exists so call
//! sites agree on names, and so a deployment that wants a `/metrics` scrape
//! endpoint can opt in without the rest of the workspace taking a dependency
//! on the `metrics` crate ecosystem.

pub mod collector;
pub mod error;
pub mod names;

#[cfg(feature = "prometheus")]
pub mod exporter;

pub use collector::collect;
pub use error::MetricsError;

#[cfg(feature = "prometheus")]
pub use exporter::PrometheusExporter;
