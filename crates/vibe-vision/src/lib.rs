//! Vision classification client.
//!
//! Sends a camera frame to the vision query endpoint with a fixed prompt and
//! turns the answer into a validated [`vibe_models::VisionAnalysis`]:
//! - `scene`: strict 25-rating parser, feature selection and scene metrics
//! - `prompt`: the fixed prompt text
//! - `client`: HTTP client with tracing and metrics

pub mod client;
pub mod error;
pub mod metrics;
pub mod prompt;
pub mod scene;
pub mod types;

pub use client::{VisionClient, VisionConfig};
pub use error::{VisionError, VisionResult};
pub use scene::{SceneParseError, SceneVector, FEATURE_SOURCE_SLOTS, RAW_SLOT_COUNT, RAW_SLOT_LABELS};
