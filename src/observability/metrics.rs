//! Metrics collection and exposition.
//!
//! # Metrics
//! - `blog_requests_total` (counter): requests by method and outcome
//! - `blog_request_duration_seconds` (histogram): latency distribution
//! - `blog_logins_total` (counter): password logins by result
//! - `blog_sessions_resolved_total` (counter): identity resolutions by source
//! - `blog_sessions` (gauge): records held by the session store
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus endpoint is optional (`observability.metrics_enabled`)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    counter!("blog_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("blog_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_login(result: &'static str) {
    counter!("blog_logins_total", "result" => result).increment(1);
}

pub fn record_session_resolved(source: &'static str) {
    counter!("blog_sessions_resolved_total", "source" => source).increment(1);
}

pub fn record_session_count(count: usize) {
    gauge!("blog_sessions").set(count as f64);
}
