//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_dispatches_total` (counter): dispatches by worker index and
//!   response status
//! - `balancer_dispatch_duration_seconds` (histogram): dispatch latency
//! - `balancer_worker_restarts_total` (counter): replacements by index
//! - `balancer_worker_exits_total` (counter): exits by index and outcome
//!
//! Updates are no-ops until an exporter is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::worker::ExitOutcome;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one dispatch and its client-visible status.
pub fn record_dispatch(worker_index: usize, status: u16, start: Instant) {
    metrics::counter!(
        "balancer_dispatches_total",
        "worker" => worker_index.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("balancer_dispatch_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record a completed worker replacement.
pub fn record_restart(worker_index: usize) {
    metrics::counter!(
        "balancer_worker_restarts_total",
        "worker" => worker_index.to_string()
    )
    .increment(1);
}

/// Record a worker exit by outcome.
pub fn record_worker_exit(worker_index: usize, outcome: ExitOutcome) {
    let outcome = match outcome {
        ExitOutcome::Clean => "clean",
        ExitOutcome::Panicked => "panicked",
        ExitOutcome::Killed => "killed",
    };
    metrics::counter!(
        "balancer_worker_exits_total",
        "worker" => worker_index.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
