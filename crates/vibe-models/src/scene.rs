//! Scene metrics and vision analysis output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Coarse traffic density bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrafficDensity {
    #[default]
    Low,
    Medium,
    High,
}

impl TrafficDensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Object counts and derived safety indicators for one frame.
///
/// Embedded into every analysis record as `cloud_vision_data`. When the
/// vision step did not produce usable output the record carries the
/// [`SceneMetrics::fallback`] shape: zero counts, `error = true` and the
/// processing error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneMetrics {
    pub pedestrian_count: u32,
    pub bicycle_count: u32,
    pub vehicle_count: u32,
    pub total_objects_detected: u32,
    #[serde(default)]
    pub traffic_density: TrafficDensity,
    #[serde(default)]
    pub congestion_level: f64,
    /// 1..=10 for real data, 0 for fallback
    pub safety_score: u8,
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SceneMetrics {
    /// Metrics recorded when classification produced nothing usable.
    pub fn fallback(error_message: impl Into<String>) -> Self {
        Self {
            pedestrian_count: 0,
            bicycle_count: 0,
            vehicle_count: 0,
            total_objects_detected: 0,
            traffic_density: TrafficDensity::Low,
            congestion_level: 0.0,
            safety_score: 0,
            error: true,
            error_message: Some(error_message.into()),
        }
    }
}

/// Validated output of the vision classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisionAnalysis {
    /// The 25 validated scene ratings, in prompt order
    pub raw_values: Vec<u8>,
    /// Scoring features selected from the raw ratings
    pub numerical_data: FeatureVector,
    /// Object counts derived from the raw ratings
    pub cloud_vision_data: SceneMetrics,
    /// Classifier confidence
    pub ml_confidence: f64,
    /// Raw model answer text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_metrics() {
        let metrics = SceneMetrics::fallback("Image fetch failed: timeout");
        assert!(metrics.error);
        assert_eq!(metrics.total_objects_detected, 0);
        assert_eq!(metrics.safety_score, 0);
        assert_eq!(metrics.error_message.as_deref(), Some("Image fetch failed: timeout"));
    }

    #[test]
    fn test_density_serialization() {
        let json = serde_json::to_string(&TrafficDensity::High).unwrap();
        assert_eq!(json, "\"high\"");
        assert_eq!(TrafficDensity::Medium.as_str(), "medium");
    }
}
