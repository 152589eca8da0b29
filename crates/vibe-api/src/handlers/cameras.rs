//! Pipeline entry point.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use tracing::{error, info};

use vibe_models::PipelineResult;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Run the analysis pipeline for one camera.
///
/// The run executes on its own task, so a client that disconnects (or a
/// run that outlives `request_timeout`) still reaches the storage step.
pub async fn process_camera_image(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> ApiResult<Json<PipelineResult>> {
    let start = Instant::now();
    let orchestrator = Arc::clone(&state.orchestrator);
    let run_id = camera_id.clone();
    let task = tokio::spawn(async move { orchestrator.run(&run_id).await });

    let joined = tokio::time::timeout(state.config.request_timeout, task).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match joined {
        Ok(Ok(Ok(result))) => {
            info!(
                camera_id = %camera_id,
                temperature_score = result.temperature_score,
                data_source = result.debug_info.data_source.as_str(),
                elapsed_ms,
                "Camera analysis served"
            );
            Ok(Json(result))
        }
        Ok(Ok(Err(e))) => Err(ApiError::from_pipeline(&camera_id, e, elapsed_ms)),
        Ok(Err(join_err)) => {
            error!(camera_id = %camera_id, "Pipeline task aborted: {}", join_err);
            Err(ApiError::PipelineFailed {
                camera_id,
                error_message: join_err.to_string(),
                processing_time_ms: elapsed_ms,
                step_failed: "unknown",
                processing_pipeline: None,
            })
        }
        Err(_) => Err(ApiError::PipelineTimeout {
            camera_id,
            timeout_secs: state.config.request_timeout.as_secs(),
        }),
    }
}
