//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, handler, status
//! - `api_request_duration_seconds` (histogram): end-to-end dispatch latency
//! - `api_failures_total` (counter): failed requests by handler and kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Prometheus exposition is opt-in via configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a completed request.
pub fn record_request(method: &str, handler: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("handler", handler.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("api_requests_total", &labels).increment(1);
    metrics::histogram!("api_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed request by failure kind.
pub fn record_failure(handler: &str, kind: &'static str) {
    metrics::counter!(
        "api_failures_total",
        "handler" => handler.to_string(),
        "kind" => kind
    )
    .increment(1);
}
