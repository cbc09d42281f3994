//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frontdoor_requests_total` (counter): requests by method, status, route kind
//! - `frontdoor_request_duration_seconds` (histogram): latency distribution
//! - `frontdoor_upstream_failures_total` (counter): failed upstream calls by
//!   rule and failure kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Route kind label values.
pub const ROUTE_PROXY: &str = "proxy";
pub const ROUTE_STATIC: &str = "static";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "frontdoor_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    histogram!(
        "frontdoor_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(rule: &str, kind: &'static str) {
    counter!(
        "frontdoor_upstream_failures_total",
        "rule" => rule.to_string(),
        "kind" => kind
    )
    .increment(1);
}
