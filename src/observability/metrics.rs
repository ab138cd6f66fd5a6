//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): inbound requests by outcome
//! - `lb_retries_total` (counter): same-backend retries by backend
//! - `lb_failovers_total` (counter): backends given up on, by backend
//! - `lb_backend_alive` (gauge): 1=alive, 0=dead
//!
//! Recording is a no-op until a recorder is installed, so tests never need
//! the exporter.

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str) {
    counter!("lb_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_retry(backend: &str) {
    counter!("lb_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_failover(backend: &str) {
    counter!("lb_failovers_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_backend_alive(backend: &str, alive: bool) {
    gauge!("lb_backend_alive", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}
