//! Shared data models for the Vibecheck camera analysis pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Monitored cameras and their provider handles
//! - The 17-element scoring feature vector
//! - Scene metrics and validated vision output
//! - Analysis records and per-step pipeline status
//! - Schedule updates and frequency tiers
//! - The caller-visible pipeline result

pub mod analysis;
pub mod camera;
pub mod features;
pub mod result;
pub mod scene;
pub mod schedule;

// Re-export common types
pub use analysis::{AnalysisRecord, DataSource, PipelineStatus, PipelineStep, StepStatus, StoredAnalysis};
pub use camera::{CameraHandles, CameraRecord, DEFAULT_SAMPLING_HOURS};
pub use features::{FeatureVector, FeatureVectorError, FEATURE_COUNT, MAX_FEATURE_VALUE};
pub use result::{AnalysisResults, DebugInfo, PipelineResult};
pub use scene::{SceneMetrics, TrafficDensity, VisionAnalysis};
pub use schedule::{FrequencyTier, ScheduleUpdate};
