//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_requests_total` (counter): requests by method, status
//! - `catalog_request_duration_seconds` (histogram): latency distribution
//! - `catalog_rate_limited_total` (counter): requests rejected by the limiter
//! - `catalog_rate_limit_tracked_clients` (gauge): addresses holding a window
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! exporter, so tests and default deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the global recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("catalog_requests_total", &labels).increment(1);
    histogram!("catalog_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("catalog_rate_limited_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("catalog_rate_limit_tracked_clients").set(count as f64);
}

/// Middleware timing every request, including admission rejections.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
