//! Metrics collection and exposition.
//!
//! # Metrics
//! - `probe_checks_total` (counter): checks by target and resulting state
//! - `probe_duration_seconds` (histogram): probe latency by target
//! - `probe_target_healthy` (gauge): 1=normal, 0=abnormal
//! - `scheduler_generation` (gauge): epoch of the running generation
//! - `scheduler_active_loops` (gauge): check loops in the running generation
//! - `status_writes_total` (counter): store writes by result
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::HealthState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(identity: &str, state: HealthState, elapsed: Duration) {
    counter!(
        "probe_checks_total",
        "target" => identity.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
    histogram!("probe_duration_seconds", "target" => identity.to_string())
        .record(elapsed.as_secs_f64());
    gauge!("probe_target_healthy", "target" => identity.to_string())
        .set(if state.is_normal() { 1.0 } else { 0.0 });
}

pub fn record_generation(epoch: u64, loops: usize) {
    gauge!("scheduler_generation").set(epoch as f64);
    gauge!("scheduler_active_loops").set(loops as f64);
}

pub fn record_status_write(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("status_writes_total", "result" => result).increment(1);
}
