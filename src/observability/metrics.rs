//! Lifecycle metrics.
//!
//! # Metrics
//! - `service_component_configure_total` (counter): configure calls by prefix, result
//! - `service_component_run_failures_total` (counter): run errors/panics by prefix
//! - `service_component_stop_total` (counter): stop acknowledgements by prefix, outcome
//! - `service_lifecycle_state` (gauge): numeric [`LifecycleState`] code

use crate::lifecycle::LifecycleState;

pub fn record_configure(prefix: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    ::metrics::counter!(
        "service_component_configure_total",
        "prefix" => prefix.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_run_failure(prefix: &str, label: &'static str) {
    ::metrics::counter!(
        "service_component_run_failures_total",
        "prefix" => prefix.to_string(),
        "error" => label
    )
    .increment(1);
}

pub fn record_stop(prefix: &str, acknowledged: bool) {
    let outcome = if acknowledged { "acknowledged" } else { "timed_out" };
    ::metrics::counter!(
        "service_component_stop_total",
        "prefix" => prefix.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_state(service: &str, state: LifecycleState) {
    ::metrics::gauge!("service_lifecycle_state", "service" => service.to_string())
        .set(f64::from(state.as_code()));
}
