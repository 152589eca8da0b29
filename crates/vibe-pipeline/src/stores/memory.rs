//! In-memory stores for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use vibe_models::{AnalysisRecord, CameraRecord, ScheduleUpdate, StoredAnalysis};

use crate::ports::{AnalysisStore, ScheduleStore, StoreError, StoreResult};

/// Schedules keyed by camera id.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduleStore {
    cameras: Arc<RwLock<HashMap<String, CameraRecord>>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cameras(cameras: impl IntoIterator<Item = CameraRecord>) -> Self {
        let map = cameras
            .into_iter()
            .map(|c| (c.camera_id.clone(), c))
            .collect();
        Self {
            cameras: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn put(&self, camera: CameraRecord) {
        self.cameras
            .write()
            .await
            .insert(camera.camera_id.clone(), camera);
    }

    pub async fn snapshot(&self, camera_id: &str) -> Option<CameraRecord> {
        self.cameras.read().await.get(camera_id).cloned()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn get_by_id(&self, camera_id: &str) -> StoreResult<Option<CameraRecord>> {
        Ok(self.cameras.read().await.get(camera_id).cloned())
    }

    async fn update_by_id(&self, camera_id: &str, update: &ScheduleUpdate) -> StoreResult<()> {
        let mut cameras = self.cameras.write().await;
        let camera = cameras
            .get_mut(camera_id)
            .ok_or_else(|| StoreError::NotFound(camera_id.to_string()))?;

        camera.current_score = Some(update.current_score);
        camera.sampling_frequency_hours = Some(update.sampling_frequency_hours);
        camera.frequency_tier = Some(update.frequency_tier);
        camera.last_analysis_time = Some(Utc::now());
        Ok(())
    }
}

/// Append-only analysis log.
///
/// Ids are v4 UUIDs; timestamps strictly increase across inserts.
#[derive(Debug, Clone, Default)]
pub struct MemoryAnalysisStore {
    records: Arc<RwLock<Vec<StoredAnalysis>>>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<StoredAnalysis> {
        self.records.read().await.clone()
    }

    fn next_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = Utc::now();
        match last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        }
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn insert(&self, record: &AnalysisRecord) -> StoreResult<StoredAnalysis> {
        let mut records = self.records.write().await;
        let timestamp = Self::next_timestamp(records.last().map(|r| r.timestamp));

        let stored = StoredAnalysis {
            id: Uuid::new_v4().to_string(),
            timestamp,
            record: record.clone(),
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<StoredAnalysis>> {
        let records = self.records.read().await;
        let mut recent: Vec<StoredAnalysis> = records.iter().rev().take(limit).cloned().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(recent)
    }
}
