//! Metrics collection and exposition.
//!
//! # Metrics
//! - `luminary_spec_loads_total` (counter): spec loads by outcome
//! - `luminary_ref_fetches_total` (counter): external ref fetches by outcome
//! - `luminary_proxy_requests_total` (counter): proxy calls by method, status
//! - `luminary_proxy_duration_seconds` (histogram): upstream latency

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one spec load (`ok`, `fetch_error`, `parse_error`).
pub fn record_spec_load(outcome: &'static str) {
    metrics::counter!("luminary_spec_loads_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of one external ref fetch (`ok`, `error`).
pub fn record_ref_fetch(outcome: &'static str) {
    metrics::counter!("luminary_ref_fetches_total", "outcome" => outcome).increment(1);
}

/// Record a completed proxy call. `status` is the upstream status, or the
/// gateway status reported to the caller when dispatch failed.
pub fn record_proxy_request(method: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "luminary_proxy_requests_total",
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("luminary_proxy_duration_seconds").record(elapsed.as_secs_f64());
}

/// Extension methods collapse into one label to keep series bounded.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        "CONNECT" => "CONNECT",
        _ => "OTHER",
    }
}
