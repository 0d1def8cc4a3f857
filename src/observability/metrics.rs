//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shutdown_hooks_total` (counter): settled close hooks by outcome
//! - `shutdown_hook_duration_seconds` (histogram): time per hook
//! - `shutdown_duration_seconds` (histogram): signal to "Server stopped."
//! - `shutdown_requests_ignored_total` (counter): duplicate triggers

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lifecycle::shutdown::ShutdownState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_hook_settled(hook: &str, ok: bool, started: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("shutdown_hooks_total", "hook" => hook.to_string(), "outcome" => outcome).increment(1);
    histogram!("shutdown_hook_duration_seconds", "hook" => hook.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_shutdown(state: ShutdownState, started: Instant) {
    histogram!("shutdown_duration_seconds", "state" => state.as_str())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_ignored_request() {
    counter!("shutdown_requests_ignored_total").increment(1);
}
