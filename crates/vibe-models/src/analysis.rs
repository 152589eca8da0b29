//! Analysis records and per-step pipeline status.
//!
//! This module provides:
//! - `PipelineStep` / `StepStatus` / `PipelineStatus`: the six-step status map
//! - `DataSource`: whether a record came from live data or the fallback branch
//! - `AnalysisRecord`: the append-only fact written once per run
//! - `StoredAnalysis`: a record as read back, with store-assigned id and time

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::scene::SceneMetrics;

/// Outcome of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    #[default]
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The six ordered pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    CameraLookup,
    UuidMapping,
    ImageFetch,
    VisionAnalysis,
    TemperatureCalculation,
    Storage,
}

impl PipelineStep {
    /// All steps in execution order.
    pub const ALL: [PipelineStep; 6] = [
        Self::CameraLookup,
        Self::UuidMapping,
        Self::ImageFetch,
        Self::VisionAnalysis,
        Self::TemperatureCalculation,
        Self::Storage,
    ];

    /// Short name used in logs, metrics and `step_failed`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CameraLookup => "camera_lookup",
            Self::UuidMapping => "uuid_mapping",
            Self::ImageFetch => "image_fetch",
            Self::VisionAnalysis => "vision_analysis",
            Self::TemperatureCalculation => "temperature_calculation",
            Self::Storage => "storage",
        }
    }

    /// Key used in the `pipeline_status` map.
    pub fn status_key(&self) -> &'static str {
        match self {
            Self::CameraLookup => "step_1_camera_lookup",
            Self::UuidMapping => "step_2_uuid_mapping",
            Self::ImageFetch => "step_3_image_fetch",
            Self::VisionAnalysis => "step_4_vision_analysis",
            Self::TemperatureCalculation => "step_5_temperature_calculation",
            Self::Storage => "step_6_storage",
        }
    }
}

/// Per-step success/failure map.
///
/// Every key is a struct field, so all six are always present in the
/// serialized form. Steps start out `failed` and are flipped to `success`
/// as the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PipelineStatus {
    pub step_1_camera_lookup: StepStatus,
    pub step_2_uuid_mapping: StepStatus,
    pub step_3_image_fetch: StepStatus,
    pub step_4_vision_analysis: StepStatus,
    pub step_5_temperature_calculation: StepStatus,
    pub step_6_storage: StepStatus,
}

impl PipelineStatus {
    pub fn set(&mut self, step: PipelineStep, status: StepStatus) {
        *self.slot_mut(step) = status;
    }

    pub fn get(&self, step: PipelineStep) -> StepStatus {
        match step {
            PipelineStep::CameraLookup => self.step_1_camera_lookup,
            PipelineStep::UuidMapping => self.step_2_uuid_mapping,
            PipelineStep::ImageFetch => self.step_3_image_fetch,
            PipelineStep::VisionAnalysis => self.step_4_vision_analysis,
            PipelineStep::TemperatureCalculation => self.step_5_temperature_calculation,
            PipelineStep::Storage => self.step_6_storage,
        }
    }

    /// True when every step succeeded.
    pub fn all_success(&self) -> bool {
        PipelineStep::ALL.iter().all(|s| self.get(*s).is_success())
    }

    /// Steps currently marked failed.
    pub fn failed_steps(&self) -> Vec<PipelineStep> {
        PipelineStep::ALL
            .into_iter()
            .filter(|s| !self.get(*s).is_success())
            .collect()
    }

    fn slot_mut(&mut self, step: PipelineStep) -> &mut StepStatus {
        match step {
            PipelineStep::CameraLookup => &mut self.step_1_camera_lookup,
            PipelineStep::UuidMapping => &mut self.step_2_uuid_mapping,
            PipelineStep::ImageFetch => &mut self.step_3_image_fetch,
            PipelineStep::VisionAnalysis => &mut self.step_4_vision_analysis,
            PipelineStep::TemperatureCalculation => &mut self.step_5_temperature_calculation,
            PipelineStep::Storage => &mut self.step_6_storage,
        }
    }
}

/// Provenance of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Every step produced real data
    LiveCamera,
    /// At least one step degraded to the fallback branch
    ErrorFallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiveCamera => "live_camera",
            Self::ErrorFallback => "error_fallback",
        }
    }
}

/// Immutable fact written once per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisRecord {
    pub camera_id: String,
    pub zone_id: String,
    /// 0..=10
    pub temperature_score: f64,
    pub sampling_frequency_hours: f64,
    pub numerical_data: FeatureVector,
    pub cloud_vision_data: SceneMetrics,
    pub ml_confidence: f64,
    pub data_source: DataSource,
    pub processing_time_ms: u64,
    /// Resolved external camera id
    pub nyc_uuid: Option<String>,
    pub image_size_bytes: u64,
    pub processing_error: Option<String>,
    pub pipeline_status: PipelineStatus,
}

/// An analysis record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoredAnalysis {
    /// Store-assigned document id
    pub id: String,
    /// Store-assigned write time
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub record: AnalysisRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_all_keys() {
        let status = PipelineStatus::default();
        let json = serde_json::to_value(status).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 6);
        for step in PipelineStep::ALL {
            assert_eq!(obj[step.status_key()], "failed");
        }
    }

    #[test]
    fn test_status_set_and_get() {
        let mut status = PipelineStatus::default();
        for step in PipelineStep::ALL {
            status.set(step, StepStatus::Success);
        }
        assert!(status.all_success());

        status.set(PipelineStep::ImageFetch, StepStatus::Failed);
        assert!(!status.all_success());
        assert_eq!(status.failed_steps(), vec![PipelineStep::ImageFetch]);
    }

    #[test]
    fn test_data_source_strings() {
        assert_eq!(
            serde_json::to_string(&DataSource::LiveCamera).unwrap(),
            "\"live_camera\""
        );
        assert_eq!(
            serde_json::from_str::<DataSource>("\"error_fallback\"").unwrap(),
            DataSource::ErrorFallback
        );
        assert!(serde_json::from_str::<DataSource>("\"live_nyc_camera\"").is_err());
    }
}
