//! Metrics collection and exposition.
//!
//! # Metrics
//! - `db_probe_total` (counter): liveness probes by outcome
//! - `db_consecutive_failures` (gauge): current retry counter
//! - `db_pools_cached` (gauge): number of live pools
//! - `service_shutdowns_total` (counter): escalations to shutdown

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(outcome: &'static str) {
    ::metrics::counter!("db_probe_total", "outcome" => outcome).increment(1);
}

pub fn record_consecutive_failures(count: u32) {
    ::metrics::gauge!("db_consecutive_failures").set(f64::from(count));
}

pub fn record_pools_cached(count: usize) {
    ::metrics::gauge!("db_pools_cached").set(count as f64);
}

pub fn record_shutdown() {
    ::metrics::counter!("service_shutdowns_total").increment(1);
}
