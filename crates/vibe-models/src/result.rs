//! Caller-visible pipeline result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{DataSource, PipelineStatus};
use crate::scene::VisionAnalysis;

/// Classifier output, or an empty object when classification did not run
/// or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnalysisResults {
    Classified(Box<VisionAnalysis>),
    Empty {},
}

impl AnalysisResults {
    pub fn from_option(analysis: Option<VisionAnalysis>) -> Self {
        match analysis {
            Some(a) => Self::Classified(Box::new(a)),
            None => Self::Empty {},
        }
    }

    pub fn as_analysis(&self) -> Option<&VisionAnalysis> {
        match self {
            Self::Classified(a) => Some(a),
            Self::Empty {} => None,
        }
    }
}

/// Diagnostic details attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DebugInfo {
    pub nyc_uuid: Option<String>,
    pub image_size_bytes: u64,
    pub processing_time_ms: u64,
    pub vision_api_enabled: bool,
    pub data_source: DataSource,
}

/// Result of one completed pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineResult {
    pub success: bool,
    pub camera_id: String,
    pub zone_id: String,
    pub temperature_score: f64,
    pub analysis_results: AnalysisResults,
    pub processing_pipeline: PipelineStatus,
    pub processing_error: Option<String>,
    pub debug_info: DebugInfo,
    /// Id of the analysis record written by this run
    pub analysis_id: String,
}
