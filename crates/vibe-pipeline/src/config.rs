//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vibe_models::DEFAULT_SAMPLING_HOURS;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the public camera image service
    pub camera_image_base_url: String,
    /// Timeout for a single image fetch
    pub camera_image_timeout: Duration,
    /// Cadence written back when a camera has none persisted
    pub default_sampling_hours: f64,
    /// Optional zone lookup JSON used for reverse identifier resolution
    pub camera_directory_path: Option<PathBuf>,
    /// Optional scoring weights JSON
    pub scoring_weights_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            camera_image_base_url: "https://webcams.nyctmc.org".to_string(),
            camera_image_timeout: Duration::from_secs(10),
            default_sampling_hours: DEFAULT_SAMPLING_HOURS,
            camera_directory_path: None,
            scoring_weights_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            camera_image_base_url: std::env::var("CAMERA_IMAGE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.camera_image_base_url),
            camera_image_timeout: Duration::from_secs(
                std::env::var("CAMERA_IMAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(10),
            ),
            default_sampling_hours: std::env::var("DEFAULT_SAMPLING_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|h: &f64| h.is_finite() && *h > 0.0)
                .unwrap_or(DEFAULT_SAMPLING_HOURS),
            camera_directory_path: std::env::var("CAMERA_DIRECTORY_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            scoring_weights_path: std::env::var("SCORING_WEIGHTS_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
