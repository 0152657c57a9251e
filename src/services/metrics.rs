//! Prometheus metrics for submission-service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder};

/// Authorization chain denials by stage.
pub static AUTH_DENIALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "submission_auth_denials_total",
        "Authorization chain denials by stage",
        &["stage"] // identity, role, ownership
    )
    .expect("Failed to register auth_denials_total")
});

/// Successful state-machine transitions by entity and action.
pub static TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "submission_transitions_total",
        "Successful state-machine transitions",
        &["entity", "action"]
    )
    .expect("Failed to register transitions_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "submission_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&AUTH_DENIALS_TOTAL);
    Lazy::force(&TRANSITIONS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
