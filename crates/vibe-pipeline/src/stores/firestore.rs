//! Firestore-backed store ports.

use async_trait::async_trait;

use vibe_firestore::{AnalysisRepository, FirestoreClient, ScheduleRepository};
use vibe_models::{AnalysisRecord, CameraRecord, ScheduleUpdate, StoredAnalysis};

use crate::ports::{AnalysisStore, ScheduleStore, StoreResult};

#[derive(Clone)]
pub struct FirestoreScheduleStore {
    repo: ScheduleRepository,
}

impl FirestoreScheduleStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            repo: ScheduleRepository::new(client),
        }
    }
}

#[async_trait]
impl ScheduleStore for FirestoreScheduleStore {
    async fn get_by_id(&self, camera_id: &str) -> StoreResult<Option<CameraRecord>> {
        Ok(self.repo.get(camera_id).await?)
    }

    async fn update_by_id(&self, camera_id: &str, update: &ScheduleUpdate) -> StoreResult<()> {
        Ok(self.repo.apply_update(camera_id, update).await?)
    }
}

#[derive(Clone)]
pub struct FirestoreAnalysisStore {
    repo: AnalysisRepository,
}

impl FirestoreAnalysisStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            repo: AnalysisRepository::new(client),
        }
    }
}

#[async_trait]
impl AnalysisStore for FirestoreAnalysisStore {
    async fn insert(&self, record: &AnalysisRecord) -> StoreResult<StoredAnalysis> {
        Ok(self.repo.insert(record).await?)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<StoredAnalysis>> {
        Ok(self.repo.recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use serde_json::json;
    use vibe_firestore::FirestoreConfig;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> FirestoreClient {
        FirestoreClient::new(FirestoreConfig::emulator(server.address().to_string(), "test-project"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schedule_store_reads_camera() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"/documents/monitoring_schedules/cam-42$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/monitoring_schedules/cam-42",
                "fields": {
                    "zone_id": {"stringValue": "z-7"},
                    "nyc_uuid": {"stringValue": "nyc-uuid-1"}
                }
            })))
            .mount(&server)
            .await;

        let store = FirestoreScheduleStore::new(client(&server).await);
        let camera = store.get_by_id("cam-42").await.unwrap().unwrap();
        assert_eq!(camera.zone_id, "z-7");
        assert_eq!(camera.handles.nyc_uuid.as_deref(), Some("nyc-uuid-1"));
    }

    #[tokio::test]
    async fn test_update_of_missing_schedule_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no document to update"))
            .mount(&server)
            .await;

        let store = FirestoreScheduleStore::new(client(&server).await);
        let err = store
            .update_by_id("cam-42", &ScheduleUpdate::new(3.0, 24.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
