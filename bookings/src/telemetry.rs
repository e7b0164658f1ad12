//! Tracing subscriber and Prometheus exporter setup.

use crate::config::TelemetryConfig;
use bmp_runtime::metrics::{MetricsError, MetricsServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors installing telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directives did not parse.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Tracing already initialized: {0}")]
    AlreadyInitialized(String),

    /// The metrics exporter failed to start.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Builds the filter for `directives`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] if the directives do not parse.
pub fn env_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Installs the global tracing subscriber and, if configured, the metrics exporter.
///
/// Returns the running metrics server, if any. Must be called from within a
/// Tokio runtime when a metrics address is set.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid, a subscriber is
/// already installed, or the exporter cannot bind.
pub fn init(config: &TelemetryConfig) -> Result<Option<MetricsServer>, TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter(&config.log_filter)?)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    let Some(addr) = config.metrics_addr else {
        tracing::info!("Metrics exporter disabled");
        return Ok(None);
    };

    let mut server = MetricsServer::new(addr);
    server.start()?;
    Ok(Some(server))
}
