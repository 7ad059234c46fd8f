//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint handler.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Called once at startup before any metrics are recorded. A second call is a
/// no-op.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_store_operation(operation: &'static str, outcome: &'static str) {
    counter!("store_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_inquiry_created(outcome: &'static str) {
    counter!("inquiries_created_total", "outcome" => outcome).increment(1);
}

pub fn record_inquiry_listed(outcome: &'static str) {
    counter!("inquiries_listed_total", "outcome" => outcome).increment(1);
}
