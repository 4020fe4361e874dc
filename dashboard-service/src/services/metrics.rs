//! Prometheus metrics for dashboard-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Form action counter by action and outcome.
pub static FORM_ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dashboard_form_actions_total",
        "Total number of form actions by outcome",
        &["action", "outcome"] // success, invalid, database_error, rejected
    )
    .expect("Failed to register form_actions_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dashboard_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Page cache lookups by result.
pub static PAGE_CACHE_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dashboard_page_cache_lookups_total",
        "Page cache lookups by result",
        &["result"] // hit, miss
    )
    .expect("Failed to register page_cache_lookups_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&FORM_ACTIONS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&PAGE_CACHE_LOOKUPS);
}

pub fn record_action(action: &str, outcome: &str) {
    FORM_ACTIONS_TOTAL
        .with_label_values(&[action, outcome])
        .inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
