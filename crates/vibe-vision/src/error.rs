//! Vision client error types.

use thiserror::Error;

use crate::scene::SceneParseError;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Vision API key is not configured")]
    MissingApiKey,

    #[error("Vision API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rejected answer: {0}")]
    Parse(#[from] SceneParseError),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// True when the service answered but the answer was unusable, as
    /// opposed to the request never completing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            VisionError::Api { .. } | VisionError::InvalidResponse(_) | VisionError::Parse(_) | VisionError::Json(_)
        )
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::Timeout(_) | VisionError::Network(_) => true,
            VisionError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VisionError::MissingApiKey => "config",
            VisionError::Api { .. } => "api",
            VisionError::InvalidResponse(_) | VisionError::Json(_) => "invalid_response",
            VisionError::Parse(_) => "parse",
            VisionError::Timeout(_) => "timeout",
            VisionError::Network(_) => "network",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_vs_transport() {
        let parse = VisionError::from(SceneParseError::WrongCount {
            expected: 25,
            actual: 24,
        });
        assert!(parse.is_rejection());
        assert!(!parse.is_retryable());
        assert!(VisionError::api(400, "bad image").is_rejection());
        assert!(!VisionError::Timeout(30).is_rejection());
        assert!(VisionError::Timeout(30).is_retryable());
        assert!(VisionError::api(503, "").is_retryable());
    }
}
