//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_requests_total` (counter): served requests by method, status
//! - `mock_request_duration_seconds` (histogram): dispatch latency
//! - `mock_scan_total` (counter): completed scans
//! - `mock_routes` (gauge): routes in the published table
//! - `mock_skips_total` / `mock_ignores_total` (counter): by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "mock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("mock_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_scan(routes: usize) {
    metrics::counter!("mock_scan_total").increment(1);
    metrics::gauge!("mock_routes").set(routes as f64);
}

pub fn record_skip(reason: &'static str) {
    metrics::counter!("mock_skips_total", "reason" => reason).increment(1);
}

pub fn record_ignore(reason: &'static str) {
    metrics::counter!("mock_ignores_total", "reason" => reason).increment(1);
}
