//! Processing tracker.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use vibe_models::StoredAnalysis;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Number of analyses returned, newest first.
pub const RECENT_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct TrackerResponse {
    pub success: bool,
    pub timestamp: String,
    pub recent_analyses: Vec<StoredAnalysis>,
    pub system_status: &'static str,
}

pub async fn processing_tracker(State(state): State<AppState>) -> ApiResult<Json<TrackerResponse>> {
    let recent_analyses = state
        .orchestrator
        .analyses()
        .recent(RECENT_LIMIT)
        .await
        .map_err(|e| {
            warn!("Processing tracker query failed: {}", e);
            ApiError::TrackerFailed(e.to_string())
        })?;

    Ok(Json(TrackerResponse {
        success: true,
        timestamp: Utc::now().to_rfc3339(),
        recent_analyses,
        system_status: "operational",
    }))
}
