//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): routing outcomes by `outcome`
//! - `router_decision_duration_seconds` (histogram): time spent in the pipeline
//! - `router_stats_submit_failures_total` (counter): stats events lost
//! - `router_heartbeat_total` (counter): registration pings by `result`
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one routing decision.
pub fn record_decision(outcome: &'static str, start: Instant) {
    metrics::counter!("router_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("router_decision_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_stats_failure() {
    metrics::counter!("router_stats_submit_failures_total").increment(1);
}

pub fn record_heartbeat(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("router_heartbeat_total", "result" => result).increment(1);
}
