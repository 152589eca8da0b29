//! Axum HTTP API for the camera analysis pipeline.
//!
//! This crate provides:
//! - `GET /api/camera-image/:camera_id`, one pipeline run per request
//! - `GET /api/processing-tracker`, the most recent analyses
//! - Health and readiness probes
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
