//! Firestore request metrics.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Total Firestore requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "firestore_requests_total";
    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "firestore_retries_total";
    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "firestore_latency_seconds";
}

/// Record a completed request.
pub fn record_request(operation: &str, status: u16, elapsed: Duration) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}
