//! Analysis record repository.
//!
//! Records are append-only documents in `analyses/{uuid}`. The `timestamp`
//! field is stamped by the server at commit time.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use vibe_models::{AnalysisRecord, StoredAnalysis};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, StructuredQuery, Write};

/// Collection holding analysis records.
pub const ANALYSES_COLLECTION: &str = "analyses";

/// Repository for analysis records.
#[derive(Clone)]
pub struct AnalysisRepository {
    client: FirestoreClient,
}

impl AnalysisRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Insert a record under a fresh id.
    ///
    /// Not retried: a lost response would otherwise risk a duplicate record.
    pub async fn insert(&self, record: &AnalysisRecord) -> FirestoreResult<StoredAnalysis> {
        let id = Uuid::new_v4().to_string();
        let fields = Document::fields_from_json(serde_json::to_value(record)?)?;
        let name = self.client.full_document_name(ANALYSES_COLLECTION, &id);

        let write = Write::update(Document::named(name, fields))
            .with_server_timestamp("timestamp")
            .must_exist(false);

        let response = self.client.commit(vec![write]).await?;
        let timestamp = response.committed_at().unwrap_or_else(|| {
            warn!(analysis_id = %id, "Commit response had no commit time");
            Utc::now()
        });

        info!(
            analysis_id = %id,
            camera_id = %record.camera_id,
            data_source = record.data_source.as_str(),
            "Stored analysis record"
        );

        Ok(StoredAnalysis {
            id,
            timestamp,
            record: record.clone(),
        })
    }

    /// Most recent records, newest first.
    pub async fn recent(&self, limit: usize) -> FirestoreResult<Vec<StoredAnalysis>> {
        let docs = self
            .client
            .with_retry("recent_analyses", || {
                let query = StructuredQuery::collection(ANALYSES_COLLECTION)
                    .order_by_desc("timestamp")
                    .limit(limit);
                self.client.run_query("", query)
            })
            .await?;

        let mut out = Vec::with_capacity(docs.len());
        for doc in &docs {
            match document_to_analysis(doc) {
                Ok(a) => out.push(a),
                Err(e) => warn!(doc = ?doc.name, "Skipping unreadable analysis record: {}", e),
            }
        }
        Ok(out)
    }
}

/// Map a stored document back to a record.
pub fn document_to_analysis(doc: &Document) -> FirestoreResult<StoredAnalysis> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_response("analysis document has no name"))?
        .to_string();

    let mut json = doc.to_json();
    let obj = json
        .as_object_mut()
        .ok_or_else(|| FirestoreError::invalid_response("analysis document has no fields"))?;

    if !obj.contains_key("timestamp") {
        let fallback = doc
            .create_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
            .ok_or_else(|| FirestoreError::invalid_response(format!("analysis {} has no timestamp", id)))?;
        obj.insert("timestamp".to_string(), serde_json::Value::String(fallback));
    }
    obj.insert("id".to_string(), serde_json::Value::String(id));

    serde_json::from_value(json).map_err(|e| FirestoreError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn stored_json() -> serde_json::Value {
        json!({
            "camera_id": "cam-42",
            "zone_id": "z-7",
            "temperature_score": 5.0,
            "sampling_frequency_hours": 24,
            "numerical_data": [0,1,2,0,1,2,0,1,2,0,1,2,0,1,2,0,1],
            "cloud_vision_data": {
                "pedestrian_count": 0,
                "bicycle_count": 0,
                "vehicle_count": 0,
                "total_objects_detected": 0,
                "traffic_density": "low",
                "congestion_level": 0.0,
                "safety_score": 0,
                "error": true,
                "error_message": "Image fetch failed: timeout"
            },
            "ml_confidence": 0.0,
            "data_source": "error_fallback",
            "processing_time_ms": 1200,
            "nyc_uuid": "nyc-uuid-1",
            "image_size_bytes": 0,
            "processing_error": "Image fetch failed: timeout",
            "pipeline_status": {
                "step_1_camera_lookup": "success",
                "step_2_uuid_mapping": "success",
                "step_3_image_fetch": "failed",
                "step_4_vision_analysis": "failed",
                "step_5_temperature_calculation": "success",
                "step_6_storage": "success"
            }
        })
    }

    #[test]
    fn test_document_to_analysis_with_server_timestamp() {
        let mut fields = Document::fields_from_json(stored_json()).unwrap();
        fields.insert(
            "timestamp".to_string(),
            crate::types::Value::TimestampValue("2024-05-01T12:00:00.5Z".to_string()),
        );
        let doc = Document::named("projects/p/databases/(default)/documents/analyses/abc", fields);

        let stored = document_to_analysis(&doc).unwrap();
        assert_eq!(stored.id, "abc");
        assert_eq!(stored.record.camera_id, "cam-42");
        assert_eq!(stored.record.numerical_data.total(), 16);
        assert!(!stored.record.pipeline_status.all_success());
    }

    #[test]
    fn test_document_without_timestamp_uses_create_time() {
        let mut doc = Document::named(
            "projects/p/databases/(default)/documents/analyses/xyz",
            Document::fields_from_json(stored_json()).unwrap(),
        );
        doc.create_time = Some("2024-05-01T12:00:00Z".to_string());
        assert_eq!(document_to_analysis(&doc).unwrap().id, "xyz");
    }

    #[test]
    fn test_document_without_name_is_invalid() {
        let doc = Document::new(HashMap::new());
        assert!(document_to_analysis(&doc).is_err());
    }
}
