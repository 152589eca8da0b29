//! Monitoring schedule repository.
//!
//! Documents live in `monitoring_schedules/{camera_id}`. Older imports kept
//! display data in a nested `camera` map (`name`, `handle`, `area`); both
//! layouts are read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use vibe_models::{CameraHandles, CameraRecord, FrequencyTier, ScheduleUpdate};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value, Write};

/// Collection holding one schedule document per camera.
pub const SCHEDULES_COLLECTION: &str = "monitoring_schedules";

/// Repository for camera schedule documents.
#[derive(Clone)]
pub struct ScheduleRepository {
    client: FirestoreClient,
}

impl ScheduleRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Fetch a camera by id. A missing document is `Ok(None)`.
    pub async fn get(&self, camera_id: &str) -> FirestoreResult<Option<CameraRecord>> {
        let doc = self.client.get_document(SCHEDULES_COLLECTION, camera_id).await?;
        match doc {
            Some(d) => Ok(Some(document_to_camera(camera_id, &d)?)),
            None => Ok(None),
        }
    }

    /// Apply a post-run update. The document must already exist;
    /// `last_analysis_time` is set to the server commit time.
    pub async fn apply_update(&self, camera_id: &str, update: &ScheduleUpdate) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("current_score".to_string(), update.current_score.to_firestore_value());
        fields.insert(
            "sampling_frequency_hours".to_string(),
            cadence_value(update.sampling_frequency_hours),
        );
        fields.insert(
            "frequency_tier".to_string(),
            update.frequency_tier.as_str().to_firestore_value(),
        );

        let name = self.client.full_document_name(SCHEDULES_COLLECTION, camera_id);
        let write = Write::update(Document::named(name, fields))
            .with_mask(["current_score", "sampling_frequency_hours", "frequency_tier"])
            .with_server_timestamp("last_analysis_time")
            .must_exist(true);

        self.client.commit(vec![write]).await.map_err(|e| match e {
            FirestoreError::NotFound(_) => FirestoreError::not_found(format!(
                "{}/{}",
                SCHEDULES_COLLECTION, camera_id
            )),
            other => other,
        })?;

        info!(
            camera_id = %camera_id,
            score = update.current_score,
            hours = update.sampling_frequency_hours,
            tier = update.frequency_tier.as_str(),
            "Updated monitoring schedule"
        );
        Ok(())
    }
}

// =============================================================================
// Document mapping
// =============================================================================

fn string_field(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(String::from_firestore_value)
        .filter(|s| !s.trim().is_empty())
}

/// Map a schedule document to a camera record.
///
/// `zone_id` is required; every other field is optional.
pub fn document_to_camera(camera_id: &str, doc: &Document) -> FirestoreResult<CameraRecord> {
    let empty = HashMap::new();
    let fields = doc.fields.as_ref().unwrap_or(&empty);
    let nested = fields.get("camera").and_then(Value::as_map).unwrap_or(&empty);

    let zone_id = string_field(fields, "zone_id").ok_or_else(|| {
        FirestoreError::invalid_response(format!(
            "{}/{} is missing zone_id",
            SCHEDULES_COLLECTION, camera_id
        ))
    })?;

    let handles = CameraHandles {
        nyc_uuid: string_field(fields, "nyc_uuid"),
        camera_handle: string_field(fields, "camera_handle")
            .or_else(|| string_field(nested, "handle")),
        old_handle: string_field(fields, "old_handle"),
        handle: string_field(fields, "handle"),
    };

    let name = string_field(fields, "name")
        .or_else(|| string_field(nested, "name"))
        .unwrap_or_default();
    let neighborhood = string_field(fields, "neighborhood").or_else(|| string_field(nested, "area"));

    let record = CameraRecord {
        camera_id: camera_id.to_string(),
        zone_id,
        name,
        neighborhood,
        handles,
        sampling_frequency_hours: fields
            .get("sampling_frequency_hours")
            .and_then(f64::from_firestore_value),
        current_score: fields.get("current_score").and_then(f64::from_firestore_value),
        frequency_tier: string_field(fields, "frequency_tier").and_then(|s| FrequencyTier::parse(&s)),
        last_analysis_time: fields
            .get("last_analysis_time")
            .and_then(DateTime::<Utc>::from_firestore_value),
    };

    debug!(camera_id = %camera_id, zone_id = %record.zone_id, "Loaded camera record");
    Ok(record)
}

/// Whole-hour cadences are written as integers so a document read as
/// `integerValue` keeps that kind. Fractional cadences stay doubles.
fn cadence_value(hours: f64) -> Value {
    if hours.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&hours) {
        (hours as u32).to_firestore_value()
    } else {
        hours.to_firestore_value()
    }
}
