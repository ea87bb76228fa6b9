//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_events_total` (counter): transitions received, by status
//! - `bridge_notifications_total` (counter): webhook deliveries, by sink and outcome
//! - `bridge_watch_errors_total` (counter): failed Consul polls
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter serves its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_event(status: &str) {
    metrics::counter!("bridge_events_total", "status" => status.to_string()).increment(1);
}

pub fn record_notification(sink: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "bridge_notifications_total",
        "sink" => sink.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_watch_error() {
    metrics::counter!("bridge_watch_errors_total").increment(1);
}
