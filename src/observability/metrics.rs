//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_calls_total` (counter): logical calls by method, outcome
//! - `rpc_call_duration_seconds` (histogram): end-to-end call latency
//! - `rpc_attempts_total` (counter): per-endpoint attempts by result
//! - `rpc_endpoint_health` (gauge): 1=healthy, 0=unhealthy
//! - `rpc_queue_depth`, `rpc_in_flight` (gauges)
//! - `rpc_queue_overflow_total` (counter)
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and configured at startup

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::queue::QueueStatus;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(method: &str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("rpc_calls_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!("rpc_call_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_attempt(endpoint: &str, result: &'static str) {
    ::metrics::counter!("rpc_attempts_total", "endpoint" => endpoint.to_string(), "result" => result)
        .increment(1);
}

pub fn record_endpoint_health(endpoint: &str, healthy: bool) {
    ::metrics::gauge!("rpc_endpoint_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_queue(status: QueueStatus) {
    ::metrics::gauge!("rpc_queue_depth").set(status.size as f64);
    ::metrics::gauge!("rpc_in_flight").set(status.in_flight as f64);
}

pub fn record_queue_overflow() {
    ::metrics::counter!("rpc_queue_overflow_total").increment(1);
}
