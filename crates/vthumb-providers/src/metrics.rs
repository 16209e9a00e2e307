//! Provider metrics collection.
//!
//! - Request counters by provider, operation and status
//! - Latency histograms
//! - Retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total provider requests by provider, operation and status.
    pub const REQUESTS_TOTAL: &str = "vthumb_provider_requests_total";

    /// Total retry attempts by provider and operation.
    pub const RETRIES_TOTAL: &str = "vthumb_provider_retries_total";

    /// Request latency in seconds by provider and operation.
    pub const LATENCY_SECONDS: &str = "vthumb_provider_latency_seconds";
}

/// Record metrics for a completed provider request.
pub fn record_request(provider: &str, operation: &str, status: &str, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "provider" => provider.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "provider" => provider.to_string(),
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(provider: &str, operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "provider" => provider.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}
