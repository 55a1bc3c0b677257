//! Export adapter errors.

use thiserror::Error;

/// Errors raised by an export adapter.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Installing the Prometheus recorder failed — most commonly because a
    /// recorder was already installed for this process.
    #[cfg(feature = "prometheus")]
    #[error("failed to install prometheus recorder: {0}")]
    PrometheusInstall(#[from] metrics_exporter_prometheus::BuildError),
}
