//! Pipeline metrics.

use metrics::{counter, histogram};

use vibe_models::PipelineStep;

/// Metric name constants for consistency.
pub mod names {
    /// Runs by outcome (`live_camera`, `error_fallback`, or an error kind).
    pub const RUNS_TOTAL: &str = "vibe_pipeline_runs_total";

    /// Failed steps by step name.
    pub const STEP_FAILURES_TOTAL: &str = "vibe_pipeline_step_failures_total";

    /// Wall-clock run duration in seconds.
    pub const DURATION_SECONDS: &str = "vibe_pipeline_duration_seconds";

    /// Distribution of written temperature scores.
    pub const TEMPERATURE_SCORE: &str = "vibe_pipeline_temperature_score";

    /// Fetched image size.
    pub const IMAGE_BYTES: &str = "vibe_pipeline_image_bytes";
}

pub fn record_run(outcome: &str, duration_ms: u64) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome.to_string()).increment(1);
    histogram!(names::DURATION_SECONDS).record(duration_ms as f64 / 1000.0);
}

pub fn record_step_failure(step: PipelineStep) {
    counter!(names::STEP_FAILURES_TOTAL, "step" => step.as_str()).increment(1);
}

pub fn record_score(score: f64) {
    histogram!(names::TEMPERATURE_SCORE).record(score);
}

pub fn record_image_bytes(bytes: u64) {
    histogram!(names::IMAGE_BYTES).record(bytes as f64);
}
