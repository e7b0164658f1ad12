//! Prometheus metrics for the booking lifecycle.
//!
//! Counters are recorded through the `metrics` facade, so they are no-ops
//! until a recorder is installed. [`MetricsServer`] installs the Prometheus
//! exporter with its own HTTP listener.
//!
//! # Example
//!
//! ```rust,no_run
//! use bmp_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use bmp_core::{BookingStatus, ItemsDeliveryStatus, LifecycleError};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    started: bool,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            started: false,
        }
    }

    /// Describe all metrics and start the exporter.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install() {
            Ok(()) => {
                self.started = true;
                tracing::info!(
                    addr = %self.addr,
                    "Metrics server started - available at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Whether this server installed the exporter.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!("bookings_created_total", "Total number of bookings created");
    describe_histogram!(
        "booking_creation_duration_seconds",
        "Time taken by the booking creation flow"
    );
    describe_counter!(
        "booking_status_transitions_total",
        "Total number of accepted status transitions, by from and to"
    );
    describe_counter!(
        "booking_transitions_rejected_total",
        "Total number of rejected lifecycle commands, by reason"
    );
    describe_counter!(
        "booking_items_status_changes_total",
        "Total number of items delivery status changes, by target status"
    );
    describe_counter!(
        "booking_assignments_total",
        "Total number of operator assignments"
    );
    describe_counter!(
        "booking_id_collisions_total",
        "Total number of booking identifier candidates that already existed"
    );
    describe_counter!(
        "booking_id_allocation_exhausted_total",
        "Total number of allocations that ran out of attempts"
    );
}

/// Booking lifecycle metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record a created booking.
    pub fn record_created(duration: Duration) {
        counter!("bookings_created_total").increment(1);
        histogram!("booking_creation_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an accepted status transition.
    pub fn record_transition(from: BookingStatus, to: BookingStatus) {
        counter!(
            "booking_status_transitions_total",
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
    }

    /// Record a rejected command.
    pub fn record_rejected(error: &LifecycleError) {
        counter!("booking_transitions_rejected_total", "reason" => rejection_reason(error))
            .increment(1);
    }

    /// Record an items delivery status change.
    pub fn record_items_change(to: ItemsDeliveryStatus) {
        counter!("booking_items_status_changes_total", "to" => to.as_str()).increment(1);
    }

    /// Record an operator assignment.
    pub fn record_assignment() {
        counter!("booking_assignments_total").increment(1);
    }
}

/// Identifier allocation metrics recorder.
pub struct AllocationMetrics;

impl AllocationMetrics {
    /// Record a colliding candidate.
    pub fn record_collision() {
        counter!("booking_id_collisions_total").increment(1);
    }

    /// Record an allocation that ran out of attempts.
    pub fn record_exhausted() {
        counter!("booking_id_allocation_exhausted_total").increment(1);
    }
}

const fn rejection_reason(error: &LifecycleError) -> &'static str {
    match error {
        LifecycleError::InvalidTransition { .. } => "invalid_transition",
        LifecycleError::MissingReason => "missing_reason",
        LifecycleError::InvalidEnum { .. } => "invalid_enum",
        LifecycleError::TooLong { .. } => "too_long",
        LifecycleError::NotLoaded => "not_loaded",
        LifecycleError::AlreadyCreated { .. } => "already_created",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_recorder_is_a_noop() {
        register_metrics();
        BookingMetrics::record_created(Duration::from_millis(3));
        BookingMetrics::record_transition(BookingStatus::New, BookingStatus::Cancelled);
        BookingMetrics::record_rejected(&LifecycleError::MissingReason);
        AllocationMetrics::record_collision();
    }

    #[test]
    fn rejection_reasons_are_stable() {
        assert_eq!(rejection_reason(&LifecycleError::MissingReason), "missing_reason");
        assert_eq!(
            rejection_reason(&LifecycleError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled,
            }),
            "invalid_transition"
        );
    }
}
