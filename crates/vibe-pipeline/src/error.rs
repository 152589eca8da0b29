//! Pipeline error types.

use thiserror::Error;

use vibe_models::{PipelineStatus, PipelineStep};

use crate::scoring::ScoringError;

pub type RunResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Camera not found: {camera_id}")]
    CameraNotFound { camera_id: String },

    #[error("No external identifier for camera {camera_id}")]
    IdentifierNotFound { camera_id: String },

    #[error("{cause}")]
    ImageFetch { cause: String },

    #[error("{cause}")]
    Classification { cause: String, rejected: bool },

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Persistence failed: {cause}")]
    Persistence {
        cause: String,
        pipeline_status: PipelineStatus,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn camera_not_found(camera_id: impl Into<String>) -> Self {
        Self::CameraNotFound {
            camera_id: camera_id.into(),
        }
    }

    pub fn identifier_not_found(camera_id: impl Into<String>) -> Self {
        Self::IdentifierNotFound {
            camera_id: camera_id.into(),
        }
    }

    pub fn image_fetch(cause: impl Into<String>) -> Self {
        Self::ImageFetch {
            cause: cause.into(),
        }
    }

    /// The vision service answered, but the answer was unusable.
    pub fn classification_rejected(cause: impl Into<String>) -> Self {
        Self::Classification {
            cause: cause.into(),
            rejected: true,
        }
    }

    /// The vision request never produced an answer.
    pub fn classification_failed(cause: impl Into<String>) -> Self {
        Self::Classification {
            cause: cause.into(),
            rejected: false,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Caller-facing message recorded as the run's `processing_error`.
    pub fn processing_message(&self) -> String {
        match self {
            PipelineError::IdentifierNotFound { .. } => format!("UUID mapping failed: {}", self),
            PipelineError::ImageFetch { cause } => format!("Image fetch failed: {}", cause),
            PipelineError::Classification {
                cause,
                rejected: true,
            } => format!("Vision API error: {}", cause),
            PipelineError::Classification { cause, .. } => {
                format!("Vision processing failed: {}", cause)
            }
            PipelineError::Scoring(e) => format!("Temperature calculation failed: {}", e),
            other => other.to_string(),
        }
    }

    /// Step that failed, for errors that end a run.
    pub fn failed_step(&self) -> PipelineStep {
        match self {
            PipelineError::IdentifierNotFound { .. } => PipelineStep::UuidMapping,
            PipelineError::ImageFetch { .. } => PipelineStep::ImageFetch,
            PipelineError::Classification { .. } => PipelineStep::VisionAnalysis,
            PipelineError::Scoring(_) => PipelineStep::TemperatureCalculation,
            PipelineError::Persistence { .. } => PipelineStep::Storage,
            PipelineError::CameraNotFound { .. }
            | PipelineError::Store(_)
            | PipelineError::Config(_) => PipelineStep::CameraLookup,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::CameraNotFound { .. } => "camera_not_found",
            PipelineError::IdentifierNotFound { .. } => "identifier_not_found",
            PipelineError::ImageFetch { .. } => "image_fetch",
            PipelineError::Classification { .. } => "classification",
            PipelineError::Scoring(_) => "scoring",
            PipelineError::Persistence { .. } => "persistence",
            PipelineError::Store(_) => "store",
            PipelineError::Config(_) => "config",
        }
    }
}
