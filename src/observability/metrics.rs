//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_decisions_total` (counter): decisions by kind
//! - `router_request_duration_seconds` (histogram): latency by decision and status
//! - `router_upstream_errors_total` (counter): failed forwards to the renderer
//! - `router_config_reloads_total` (counter): reloads by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Tenant is never a label (unbounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a routing decision and the time taken to serve it.
pub fn record_request(decision: &'static str, status: u16, start: Instant) {
    metrics::counter!("router_decisions_total", "decision" => decision).increment(1);
    metrics::histogram!(
        "router_request_duration_seconds",
        "decision" => decision,
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    metrics::counter!("router_upstream_errors_total").increment(1);
}

pub fn record_config_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("router_config_reloads_total", "result" => result).increment(1);
}
