//! Application state.

use std::sync::Arc;

use vibe_pipeline::{Orchestrator, PipelineConfig, RunResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create application state wired to the production collaborators.
    pub async fn new(config: ApiConfig) -> RunResult<Self> {
        let orchestrator = Orchestrator::from_env(PipelineConfig::from_env()).await?;
        Ok(Self::from_parts(config, orchestrator))
    }

    pub fn from_parts(config: ApiConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
