//! Metrics collection and exposition.
//!
//! # Metrics
//! - `allocator_selections_total` (counter): selections by group, policy, action, outcome
//! - `allocator_releases_total` (counter): released units by group
//! - `allocator_row_total` (gauge): current usage per group and row
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-ops until a recorder is installed
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one selection; `action` is "allocate" (committed) or "select" (dry run).
pub fn record_selection(group: &str, policy: &str, action: &'static str, outcome: &'static str) {
    metrics::counter!(
        "allocator_selections_total",
        "group" => group.to_string(),
        "policy" => policy.to_string(),
        "action" => action,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one released unit.
pub fn record_release(group: &str) {
    metrics::counter!("allocator_releases_total", "group" => group.to_string()).increment(1);
}

/// Publish a row's current usage.
pub fn record_row_total(group: &str, row: u64, total: u64) {
    metrics::gauge!(
        "allocator_row_total",
        "group" => group.to_string(),
        "row" => row.to_string()
    )
    .set(total as f64);
}
