/// Metrics and telemetry for the agent gate
///
/// Prometheus metrics for verification outcomes, cache behavior, and
/// remote service latency.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    /// Remote verification outcomes by kind (verified / denied / unavailable)
    pub static ref VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "agent_gate_verifications_total",
        "Remote verification outcomes",
        &["outcome"]
    )
    .unwrap();

    /// Verification cache hits (fresh entry, no remote call)
    pub static ref CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        "agent_gate_cache_hits_total",
        "Verification cache hits"
    )
    .unwrap();

    /// Verification cache misses
    pub static ref CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        "agent_gate_cache_misses_total",
        "Verification cache misses"
    )
    .unwrap();

    /// Entries currently held by the in-memory store
    pub static ref CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "agent_gate_cache_entries",
        "Entries currently held by the in-memory verification cache"
    )
    .unwrap();

    /// Remote verification call latency in seconds
    pub static ref REMOTE_VERIFY_DURATION_SECONDS: Histogram = register_histogram!(
        "agent_gate_remote_verify_duration_seconds",
        "Remote verification call latencies in seconds",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();
}

/// Render all metrics in the Prometheus text exposition format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}
