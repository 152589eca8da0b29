//! Vision client metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Vision queries by outcome (`ok` or an error kind).
    pub const REQUESTS_TOTAL: &str = "vibe_vision_requests_total";

    /// Query latency in seconds.
    pub const LATENCY_SECONDS: &str = "vibe_vision_latency_seconds";
}

pub fn record_query(status: &str, latency_ms: f64) {
    counter!(names::REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
    histogram!(names::LATENCY_SECONDS).record(latency_ms / 1000.0);
}
