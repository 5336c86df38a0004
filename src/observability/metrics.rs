//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): intercepted requests by disposition
//!   (`forward`, `bypass`)
//! - `relay_downstream_duration_seconds` (histogram): downstream latency by
//!   status (`error` when no response arrived)
//! - `relay_forward_errors_total` (counter): failures by kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_disposition(disposition: &'static str) {
    metrics::counter!("relay_requests_total", "disposition" => disposition).increment(1);
}

pub fn record_downstream(status: Option<u16>, started: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    metrics::histogram!("relay_downstream_duration_seconds", "status" => status)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_forward_error(kind: &'static str) {
    metrics::counter!("relay_forward_errors_total", "kind" => kind).increment(1);
}
