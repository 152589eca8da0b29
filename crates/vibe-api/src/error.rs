//! API error types.
//!
//! Every body carries an `error` summary; pipeline failures add
//! `camera_id` and `step_failed` for dashboard clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use vibe_models::PipelineStatus;
use vibe_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Camera not found: {camera_id}")]
    CameraNotFound { camera_id: String },

    #[error("Image processing pipeline failed: {error_message}")]
    PipelineFailed {
        camera_id: String,
        error_message: String,
        processing_time_ms: u64,
        step_failed: &'static str,
        processing_pipeline: Option<PipelineStatus>,
    },

    #[error("Pipeline run for {camera_id} exceeded {timeout_secs}s")]
    PipelineTimeout { camera_id: String, timeout_secs: u64 },

    #[error("Processing tracker failed: {0}")]
    TrackerFailed(String),
}

impl ApiError {
    /// Map a failed run to its response shape.
    pub fn from_pipeline(camera_id: &str, err: PipelineError, processing_time_ms: u64) -> Self {
        match err {
            PipelineError::CameraNotFound { camera_id } => Self::CameraNotFound { camera_id },
            PipelineError::Persistence {
                cause,
                pipeline_status,
            } => Self::PipelineFailed {
                camera_id: camera_id.to_string(),
                error_message: cause,
                processing_time_ms,
                step_failed: vibe_models::PipelineStep::Storage.as_str(),
                processing_pipeline: Some(pipeline_status),
            },
            other => Self::PipelineFailed {
                camera_id: camera_id.to_string(),
                error_message: other.to_string(),
                processing_time_ms,
                step_failed: other.failed_step().as_str(),
                processing_pipeline: None,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CameraNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PipelineTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::PipelineFailed { .. } | ApiError::TrackerFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn hide_internal(detail: String) -> String {
    if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
        "An internal error occurred".to_string()
    } else {
        detail
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::CameraNotFound { camera_id } => json!({
                "error": "Camera not found",
                "camera_id": camera_id,
                "step_failed": "camera_lookup",
            }),
            ApiError::PipelineFailed {
                camera_id,
                error_message,
                processing_time_ms,
                step_failed,
                processing_pipeline,
            } => {
                let mut body = json!({
                    "error": "Image processing pipeline failed",
                    "camera_id": camera_id,
                    "error_message": error_message,
                    "processing_time_ms": processing_time_ms,
                    "step_failed": step_failed,
                });
                if let Some(pipeline) = processing_pipeline {
                    body["processing_pipeline"] = json!(pipeline);
                }
                body
            }
            ApiError::PipelineTimeout {
                camera_id,
                timeout_secs,
            } => json!({
                "error": "Image processing pipeline timed out",
                "camera_id": camera_id,
                "timeout_secs": timeout_secs,
            }),
            ApiError::TrackerFailed(details) => json!({
                "error": "Processing tracker failed",
                "details": hide_internal(details),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibe_models::StepStatus;

    #[test]
    fn test_from_pipeline_camera_not_found() {
        let err = ApiError::from_pipeline("cam-1", PipelineError::camera_not_found("cam-1"), 3);
        assert!(matches!(err, ApiError::CameraNotFound { ref camera_id } if camera_id == "cam-1"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_from_pipeline_persistence_keeps_status() {
        let mut status = PipelineStatus::default();
        status.step_6_storage = StepStatus::Failed;
        let err = ApiError::from_pipeline(
            "cam-1",
            PipelineError::Persistence {
                cause: "insert failed".to_string(),
                pipeline_status: status,
            },
            120,
        );

        match err {
            ApiError::PipelineFailed {
                step_failed,
                processing_pipeline,
                processing_time_ms,
                ..
            } => {
                assert_eq!(step_failed, "storage");
                assert_eq!(processing_time_ms, 120);
                assert!(processing_pipeline.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_pipeline_store_fault() {
        let err = ApiError::from_pipeline("cam-1", PipelineError::store("connection reset"), 8);
        match err {
            ApiError::PipelineFailed {
                step_failed,
                processing_pipeline,
                ..
            } => {
                assert_eq!(step_failed, "camera_lookup");
                assert!(processing_pipeline.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
