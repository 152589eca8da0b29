//! Run the camera analysis pipeline once per camera id.
//!
//! Usage: `vibe-analyze <camera_id>...`
//!
//! Each result is printed to stdout as JSON; logs go to stderr.

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vibe_pipeline::{Orchestrator, PipelineConfig, PipelineError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    let camera_ids: Vec<String> = std::env::args().skip(1).collect();
    if camera_ids.is_empty() {
        return Err(anyhow::anyhow!("usage: vibe-analyze <camera_id>..."));
    }

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);
    let orchestrator = Orchestrator::from_env(config).await?;

    let mut failures = 0usize;
    for camera_id in &camera_ids {
        let output = match orchestrator.run(camera_id).await {
            Ok(result) => serde_json::to_value(&result)?,
            Err(e) => {
                failures += 1;
                error!(camera_id = %camera_id, "Run failed: {}", e);
                failure_json(camera_id, &e)
            }
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if failures > 0 {
        return Err(anyhow::anyhow!("{} of {} runs failed", failures, camera_ids.len()));
    }
    Ok(())
}

fn failure_json(camera_id: &str, e: &PipelineError) -> serde_json::Value {
    match e {
        PipelineError::Persistence { pipeline_status, .. } => json!({
            "camera_id": camera_id,
            "error": e.to_string(),
            "step_failed": e.failed_step().as_str(),
            "processing_pipeline": pipeline_status,
        }),
        _ => json!({
            "camera_id": camera_id,
            "error": e.to_string(),
            "step_failed": e.failed_step().as_str(),
        }),
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vibe_pipeline=info,vibe_vision=info,vibe_firestore=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}
