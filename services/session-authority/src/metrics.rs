//! Prometheus metrics for the session authority.
//!
//! Provides counters and histograms for observability.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_authority_tokens_issued_total",
        "Total number of session tokens issued",
        &["token_type"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Refresh attempts counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_authority_tokens_refreshed_total",
        "Total number of access token refresh attempts",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Gate decisions counter.
pub static GATE_DECISIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_authority_gate_decisions_total",
        "Total number of request authorization decisions",
        &["outcome"]
    )
    .expect("Failed to register gate_decisions metric")
});

/// Recovery operations counter.
pub static RECOVERY_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_authority_recovery_operations_total",
        "Total number of password recovery operations",
        &["operation", "status"]
    )
    .expect("Failed to register recovery_operations metric")
});

/// Notification deliveries counter.
pub static NOTIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_authority_notifications_total",
        "Total number of recovery notification deliveries",
        &["status"]
    )
    .expect("Failed to register notifications metric")
});

/// Notification delivery latency histogram.
pub static NOTIFICATION_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "session_authority_notification_latency_seconds",
        "Recovery notification delivery latency in seconds",
        &["status"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register notification_latency metric")
});

/// Record a token issuance.
pub fn record_token_issued(token_type: &str) {
    TOKENS_ISSUED.with_label_values(&[token_type]).inc();
}

/// Record a refresh attempt.
pub fn record_token_refreshed(status: &str) {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}

/// Record an admit or reject decision.
pub fn record_gate_decision(outcome: &str) {
    GATE_DECISIONS.with_label_values(&[outcome]).inc();
}

/// Record a recovery issue or redeem.
pub fn record_recovery_operation(operation: &str, status: &str) {
    RECOVERY_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
}

/// Record a notification delivery outcome.
pub fn record_notification(status: &str, duration_secs: Option<f64>) {
    NOTIFICATIONS.with_label_values(&[status]).inc();
    if let Some(secs) = duration_secs {
        NOTIFICATION_LATENCY
            .with_label_values(&[status])
            .observe(secs);
    }
}
