//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for pipeline runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use vibe_models::{PipelineStatus, PipelineStep, StepStatus};

/// Run logger for structured logging with consistent formatting.
///
/// Every event carries the run id and the camera id.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    camera_id: String,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    pub fn new(camera_id: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            camera_id: camera_id.to_string(),
        }
    }

    /// Create a logger for an existing run id.
    pub fn from_string(run_id: &str, camera_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            camera_id: camera_id.to_string(),
        }
    }

    pub fn log_start(&self) {
        info!(
            run_id = %self.run_id,
            camera_id = %self.camera_id,
            "Pipeline run started"
        );
    }

    /// Log the outcome of one step.
    pub fn log_step(&self, step: PipelineStep, status: StepStatus, detail: &str) {
        match status {
            StepStatus::Success => info!(
                run_id = %self.run_id,
                camera_id = %self.camera_id,
                step = step.as_str(),
                status = status.as_str(),
                "Step {}: {}", step.as_str(), detail
            ),
            StepStatus::Failed => warn!(
                run_id = %self.run_id,
                camera_id = %self.camera_id,
                step = step.as_str(),
                status = status.as_str(),
                "Step {} failed: {}", step.as_str(), detail
            ),
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            camera_id = %self.camera_id,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            camera_id = %self.camera_id,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, score: f64, data_source: &str, status: &PipelineStatus, elapsed_ms: u64) {
        info!(
            run_id = %self.run_id,
            camera_id = %self.camera_id,
            temperature_score = score,
            data_source,
            degraded_steps = %degraded_steps(status),
            elapsed_ms,
            "Pipeline run completed"
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline_run",
            run_id = %self.run_id,
            camera_id = %self.camera_id
        )
    }
}

/// Comma-separated names of the steps that took the fallback branch.
fn degraded_steps(status: &PipelineStatus) -> String {
    status
        .failed_steps()
        .iter()
        .map(|step| step.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let a = RunLogger::new("cam-42");
        let b = RunLogger::new("cam-42");

        assert_eq!(a.camera_id(), "cam-42");
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn test_degraded_steps_lists_failures_in_order() {
        let mut status = PipelineStatus::default();
        for step in PipelineStep::ALL {
            status.set(step, StepStatus::Success);
        }
        assert_eq!(degraded_steps(&status), "");

        status.set(PipelineStep::VisionAnalysis, StepStatus::Failed);
        status.set(PipelineStep::ImageFetch, StepStatus::Failed);
        assert_eq!(degraded_steps(&status), "image_fetch,vision_analysis");
    }

    #[test]
    fn test_run_logger_from_string() {
        let logger = RunLogger::from_string("run-123", "cam-7");

        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.camera_id(), "cam-7");
    }
}
