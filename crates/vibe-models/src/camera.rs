//! Monitored camera records.
//!
//! A `CameraRecord` is the schedule-store view of one monitored camera:
//! identity, the external provider handles used to reach its feed, and
//! the current sampling state written back after each analysis run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schedule::FrequencyTier;

/// Sampling cadence assumed when a camera has none persisted.
pub const DEFAULT_SAMPLING_HOURS: f64 = 24.0;

/// A monitored camera as stored in the schedule collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CameraRecord {
    /// Internal camera id (document id in the schedule store)
    pub camera_id: String,

    /// Monitored zone this camera covers
    pub zone_id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Neighborhood / area label, used for baseline cadence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,

    /// External handles for the camera provider
    #[serde(default)]
    pub handles: CameraHandles,

    /// Persisted sampling cadence in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_frequency_hours: Option<f64>,

    /// Last written temperature score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_score: Option<f64>,

    /// Last written frequency tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_tier: Option<FrequencyTier>,

    /// When the last analysis was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis_time: Option<DateTime<Utc>>,
}

impl CameraRecord {
    /// Create a record with only identity fields set.
    pub fn new(camera_id: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            zone_id: zone_id.into(),
            name: String::new(),
            neighborhood: None,
            handles: CameraHandles::default(),
            sampling_frequency_hours: None,
            current_score: None,
            frequency_tier: None,
            last_analysis_time: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the neighborhood label.
    pub fn with_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = Some(neighborhood.into());
        self
    }

    /// Set the explicit provider id.
    pub fn with_nyc_uuid(mut self, id: impl Into<String>) -> Self {
        self.handles.nyc_uuid = Some(id.into());
        self
    }

    /// Set the primary camera handle.
    pub fn with_camera_handle(mut self, handle: impl Into<String>) -> Self {
        self.handles.camera_handle = Some(handle.into());
        self
    }

    /// Set the persisted sampling cadence.
    pub fn with_sampling_hours(mut self, hours: f64) -> Self {
        self.sampling_frequency_hours = Some(hours);
        self
    }

    /// Persisted sampling cadence, or the given default when absent, zero
    /// or not finite. Fractional cadences are kept as stored.
    pub fn sampling_hours_or(&self, default_hours: f64) -> f64 {
        self.sampling_frequency_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(default_hours)
    }
}

/// External-provider handles attached to a camera.
///
/// Different import generations stored the provider reference under
/// different names; all of them are kept so resolution can fall back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CameraHandles {
    /// Explicit provider camera id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nyc_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl CameraHandles {
    /// Non-empty handles in resolution priority order (excluding `nyc_uuid`).
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.camera_handle, &self.old_handle, &self.handle]
            .into_iter()
            .filter_map(|h| h.as_deref())
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_hours_default() {
        let camera = CameraRecord::new("cam-1", "z-1");
        assert_eq!(camera.sampling_hours_or(DEFAULT_SAMPLING_HOURS), 24.0);

        let camera = camera.with_sampling_hours(6.0);
        assert_eq!(camera.sampling_hours_or(DEFAULT_SAMPLING_HOURS), 6.0);
    }

    #[test]
    fn test_fractional_sampling_hours_kept() {
        let camera = CameraRecord::new("cam-1", "z-1").with_sampling_hours(0.5);
        assert_eq!(camera.sampling_hours_or(DEFAULT_SAMPLING_HOURS), 0.5);

        let camera = camera.with_sampling_hours(6.5);
        assert_eq!(camera.sampling_hours_or(DEFAULT_SAMPLING_HOURS), 6.5);
    }

    #[test]
    fn test_zero_sampling_hours_falls_back() {
        let camera = CameraRecord::new("cam-1", "z-1").with_sampling_hours(0.0);
        assert_eq!(camera.sampling_hours_or(12.0), 12.0);

        let camera = camera.with_sampling_hours(f64::NAN);
        assert_eq!(camera.sampling_hours_or(12.0), 12.0);
    }

    #[test]
    fn test_handle_candidates_skip_blank() {
        let handles = CameraHandles {
            nyc_uuid: None,
            camera_handle: Some("  ".to_string()),
            old_handle: Some("old-7".to_string()),
            handle: Some("h-7".to_string()),
        };
        let found: Vec<&str> = handles.candidates().collect();
        assert_eq!(found, vec!["old-7", "h-7"]);
    }
}
