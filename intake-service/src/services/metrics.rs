//! Metrics collection for intake-service.
//!
//! HTTP metrics go through the `metrics` facade and the Prometheus exporter;
//! domain counters live in the default `prometheus` registry.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Database query duration histogram by query name.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "intake_db_query_duration_seconds",
        "Reference store query duration in seconds",
        &["query"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Diagnosis code lookups by endpoint and outcome.
pub static DIAGNOSIS_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "intake_diagnosis_lookups_total",
        "Total diagnosis code lookups",
        &["kind", "status"]
    )
    .expect("Failed to register diagnosis_lookups_total")
});

/// Insurance card analyses by outcome.
pub static CARD_ANALYSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "intake_card_analyses_total",
        "Total insurance card analyses",
        &["provider", "status"]
    )
    .expect("Failed to register card_analyses_total")
});

/// Admin notification emails by outcome.
pub static EMAILS_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "intake_admin_emails_total",
        "Total admin notification emails",
        &["status"]
    )
    .expect("Failed to register admin_emails_total")
});

/// Install the Prometheus recorder and register custom metrics.
///
/// Safe to call more than once; only the first call installs the recorder.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });

    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&DIAGNOSIS_LOOKUPS_TOTAL);
    Lazy::force(&CARD_ANALYSES_TOTAL);
    Lazy::force(&EMAILS_SENT_TOTAL);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer).ok();
    if let Ok(custom_metrics) = String::from_utf8(buffer) {
        output.push_str(&custom_metrics);
    }

    output
}

pub fn record_diagnosis_lookup(kind: &str, status: &str) {
    DIAGNOSIS_LOOKUPS_TOTAL
        .with_label_values(&[kind, status])
        .inc();
}

pub fn record_card_analysis(provider: &str, status: &str) {
    CARD_ANALYSES_TOTAL
        .with_label_values(&[provider, status])
        .inc();
}

pub fn record_email(status: &str) {
    EMAILS_SENT_TOTAL.with_label_values(&[status]).inc();
}
