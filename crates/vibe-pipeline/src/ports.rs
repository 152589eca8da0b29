//! Collaborator ports.
//!
//! The orchestrator only talks to these traits. Production wiring plugs in
//! the Firestore repositories, the HTTP image source and the vision client;
//! tests plug in the in-memory stores and fakes.

use async_trait::async_trait;
use thiserror::Error;

use vibe_firestore::FirestoreError;
use vibe_models::{AnalysisRecord, CameraRecord, ScheduleUpdate, StoredAnalysis, VisionAnalysis};

use crate::error::RunResult;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store port.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<FirestoreError> for StoreError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::NotFound(path) => StoreError::NotFound(path),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// A fetched camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraImage {
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
    pub content_type: String,
}

impl CameraImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// Monitored camera schedules.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_by_id(&self, camera_id: &str) -> StoreResult<Option<CameraRecord>>;

    /// Merge the update into an existing schedule and stamp
    /// `last_analysis_time` with the store clock.
    async fn update_by_id(&self, camera_id: &str, update: &ScheduleUpdate) -> StoreResult<()>;
}

/// Append-only analysis records.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert a record; the store assigns the id and timestamp.
    async fn insert(&self, record: &AnalysisRecord) -> StoreResult<StoredAnalysis>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<StoredAnalysis>>;
}

/// Maps a camera to the provider's camera id.
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    async fn resolve(&self, camera: &CameraRecord) -> RunResult<String>;
}

/// Fetches a single still frame.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, external_id: &str) -> RunResult<CameraImage>;
}

/// Classifies a frame into scene features.
#[async_trait]
pub trait SceneClassifier: Send + Sync {
    async fn classify(&self, image: &CameraImage) -> RunResult<VisionAnalysis>;

    /// Whether a live classifier is configured.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_image_size() {
        let image = CameraImage::new(vec![0u8; 8000], "image/jpeg");
        assert_eq!(image.size_bytes, 8000);
    }

    #[test]
    fn test_store_error_from_firestore() {
        assert!(matches!(
            StoreError::from(FirestoreError::not_found("monitoring_schedules/cam-1")),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from(FirestoreError::ServerError(503, "unavailable".into())),
            StoreError::Backend(_)
        ));
    }
}
