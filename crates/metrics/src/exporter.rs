//! Prometheus export adapter, enabled by the `prometheus` feature.
//!
//! Bridges onto the `metrics`/`metrics-exporter-prometheus` crates: installs
//! a process-global recorder once, then records under the canonical names
//! in [`crate::names`] through it. [`nebula_telemetry::metrics::MetricsRegistry`]
//! remains the dependency-free default registry every crate records through;
//! this is an additional sink a deployment opts into, not a replacement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use nebula_telemetry::metrics::MetricsRegistry;

use crate::error::MetricsError;

/// Installs the global Prometheus recorder and renders its text-format
/// scrape body on demand.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
    last_synced: Arc<Mutex<HashMap<&'static str, u64>>>,
}

impl PrometheusExporter {
    /// Install the process-global Prometheus recorder.
    ///
    /// Must be called at most once per process — `metrics` only supports one
    /// global recorder, so a second call returns
    /// [`MetricsError::PrometheusInstall`].
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self {
            handle,
            last_synced: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Render the current metrics in Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Increment a counter under a canonical name (see [`crate::names`]).
    pub fn incr_counter(&self, name: &'static str, value: u64) {
        metrics::counter!(name).increment(value);
    }

    /// Set a gauge under a canonical name.
    pub fn set_gauge(&self, name: &'static str, value: f64) {
        metrics::gauge!(name).set(value);
    }

    /// Record a histogram observation under a canonical name.
    pub fn observe_histogram(&self, name: &'static str, value: f64) {
        metrics::histogram!(name).record(value);
    }

    /// Pull the current value of each named counter out of a
    /// [`MetricsRegistry`] and push it into the Prometheus recorder.
    ///
    /// `MetricsRegistry` counters are absolute (atomic) totals, while the
    /// `metrics` crate's counter only supports relative increments, so this
    /// tracks the delta since the last sync per name rather than setting an
    /// absolute value.
    pub fn sync_counters(&self, registry: &MetricsRegistry, names: &[&'static str]) {
        for &name in names {
            let current = registry.counter(name).get();
            let previous = self
                .last_synced
                .lock()
                .expect("exporter sync lock poisoned")
                .insert(name, current)
                .unwrap_or(0);
            if current > previous {
                self.incr_counter(name, current - previous);
            }
        }
    }

    /// Mirror each named gauge's current value into the Prometheus recorder.
    pub fn sync_gauges(&self, registry: &MetricsRegistry, names: &[&'static str]) {
        for &name in names {
            self.set_gauge(name, registry.gauge(name).get() as f64);
        }
    }
}
