//! Camera analysis orchestrator.
//!
//! Runs the six ordered steps for one camera and owns the fallback policy:
//!
//! 1. camera lookup (terminal on failure)
//! 2. identifier resolution
//! 3. image acquisition
//! 4. vision classification
//! 5. score derivation (always runs; synthetic features on fallback)
//! 6. persistence: analysis insert, then schedule update
//!
//! Steps 2 to 5 never abort the run. Their first error becomes the record's
//! `processing_error` and the record is tagged `error_fallback`.

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tracing::Instrument;

use vibe_firestore::FirestoreClient;
use vibe_models::{
    AnalysisRecord, AnalysisResults, CameraRecord, DataSource, DebugInfo, FeatureVector, PipelineResult,
    PipelineStatus, PipelineStep, SceneMetrics, ScheduleUpdate, StepStatus, VisionAnalysis, FEATURE_COUNT,
};
use vibe_vision::VisionClient;

use crate::acquire::HttpImageSource;
use crate::classifier::VisionSceneClassifier;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, RunResult};
use crate::logging::RunLogger;
use crate::metrics::{record_image_bytes, record_run, record_score, record_step_failure};
use crate::ports::{AnalysisStore, IdentifierResolver, ImageSource, SceneClassifier, ScheduleStore};
use crate::resolver::{CameraDirectory, DirectoryResolver};
use crate::scoring::{AdaptiveScorer, ScoringWeights, FALLBACK_SCORE};
use crate::stores::{FirestoreAnalysisStore, FirestoreScheduleStore};

/// Highest value in a synthetic fallback vector.
const SYNTHETIC_MAX: u8 = 2;

/// The orchestrator's injected dependencies.
#[derive(Clone)]
pub struct Collaborators {
    pub schedules: Arc<dyn ScheduleStore>,
    pub analyses: Arc<dyn AnalysisStore>,
    pub resolver: Arc<dyn IdentifierResolver>,
    pub images: Arc<dyn ImageSource>,
    pub classifier: Arc<dyn SceneClassifier>,
}

/// Immutable pipeline driver, shared across runs.
#[derive(Clone)]
pub struct Orchestrator {
    deps: Collaborators,
    scorer: AdaptiveScorer,
    default_sampling_hours: f64,
}

impl Orchestrator {
    pub fn new(deps: Collaborators, scorer: AdaptiveScorer, config: &PipelineConfig) -> Self {
        Self {
            deps,
            scorer,
            default_sampling_hours: config.default_sampling_hours,
        }
    }

    /// Wire the production collaborators from environment configuration.
    pub async fn from_env(config: PipelineConfig) -> RunResult<Self> {
        let firestore = FirestoreClient::from_env()
            .await
            .map_err(|e| PipelineError::config_error(format!("Firestore: {}", e)))?;
        let vision = VisionClient::from_env()
            .map_err(|e| PipelineError::config_error(format!("Vision client: {}", e)))?;
        if vision.config().api_key.is_none() {
            tracing::warn!("VISION_API_KEY not set; every run will use the fallback branch");
        }

        let directory = match &config.camera_directory_path {
            Some(path) => CameraDirectory::load(path)?,
            None => CameraDirectory::default(),
        };

        let weights = match &config.scoring_weights_path {
            Some(path) => ScoringWeights::load(path).map_err(|e| PipelineError::config_error(e.to_string()))?,
            None => ScoringWeights::default(),
        };
        let scorer = AdaptiveScorer::validated(weights).map_err(|e| PipelineError::config_error(e.to_string()))?;

        let deps = Collaborators {
            schedules: Arc::new(FirestoreScheduleStore::new(firestore.clone())),
            analyses: Arc::new(FirestoreAnalysisStore::new(firestore)),
            resolver: Arc::new(DirectoryResolver::new(directory)),
            images: Arc::new(HttpImageSource::from_config(&config)?),
            classifier: Arc::new(VisionSceneClassifier::new(vision)),
        };

        Ok(Self::new(deps, scorer, &config))
    }

    pub fn schedules(&self) -> &Arc<dyn ScheduleStore> {
        &self.deps.schedules
    }

    pub fn analyses(&self) -> &Arc<dyn AnalysisStore> {
        &self.deps.analyses
    }

    pub fn scorer(&self) -> &AdaptiveScorer {
        &self.scorer
    }

    /// Run the pipeline once for a camera.
    pub async fn run(&self, camera_id: &str) -> RunResult<PipelineResult> {
        let logger = RunLogger::new(camera_id);
        let span = logger.create_span();
        let start = Instant::now();

        let result = self.run_steps(camera_id, &logger, start).instrument(span).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(r) => record_run(r.debug_info.data_source.as_str(), elapsed_ms),
            Err(e) => {
                logger.log_error(&e.to_string());
                record_step_failure(e.failed_step());
                record_run(e.kind(), elapsed_ms);
            }
        }
        result
    }

    async fn run_steps(&self, camera_id: &str, logger: &RunLogger, start: Instant) -> RunResult<PipelineResult> {
        logger.log_start();
        let mut state = RunState::new(logger);

        // Step 1: camera lookup
        let camera = self
            .deps
            .schedules
            .get_by_id(camera_id)
            .await
            .map_err(|e| PipelineError::store(e.to_string()))?
            .ok_or_else(|| PipelineError::camera_not_found(camera_id))?;
        state.succeed(PipelineStep::CameraLookup, &camera.zone_id);

        // Step 2: identifier resolution
        let external_id = match self.deps.resolver.resolve(&camera).await {
            Ok(id) => {
                state.succeed(PipelineStep::UuidMapping, &id);
                Some(id)
            }
            Err(e) => {
                state.fail(PipelineStep::UuidMapping, &e);
                None
            }
        };
        state.external_id = external_id.clone();

        // Step 3: image acquisition
        let image = match &external_id {
            Some(id) => match self.deps.images.fetch(id).await {
                Ok(image) => {
                    record_image_bytes(image.size_bytes);
                    state.image_size_bytes = image.size_bytes;
                    state.succeed(PipelineStep::ImageFetch, &format!("{} bytes", image.size_bytes));
                    Some(image)
                }
                Err(e) => {
                    state.fail(PipelineStep::ImageFetch, &e);
                    None
                }
            },
            None => {
                state.skip(PipelineStep::ImageFetch);
                None
            }
        };

        // Step 4: vision classification
        let analysis = match &image {
            Some(image) => match self.deps.classifier.classify(image).await {
                Ok(analysis) => {
                    state.succeed(PipelineStep::VisionAnalysis, "25 values accepted");
                    Some(analysis)
                }
                Err(e) => {
                    state.fail(PipelineStep::VisionAnalysis, &e);
                    None
                }
            },
            None => {
                state.skip(PipelineStep::VisionAnalysis);
                None
            }
        };

        // Step 5: score derivation
        let sampling_hours = camera.sampling_hours_or(self.default_sampling_hours);
        let (temperature_score, features) = self.derive_score(&mut state, &camera, analysis.as_ref(), sampling_hours);
        record_score(temperature_score);

        // Step 6: persistence
        let data_source = state.data_source();
        let processing_time_ms = start.elapsed().as_millis() as u64;
        let cloud_vision_data = match &analysis {
            Some(a) => a.cloud_vision_data.clone(),
            None => SceneMetrics::fallback(state.processing_error.clone().unwrap_or_default()),
        };

        let mut pipeline_status = state.status;
        pipeline_status.set(PipelineStep::Storage, StepStatus::Success);

        let record = AnalysisRecord {
            camera_id: camera.camera_id.clone(),
            zone_id: camera.zone_id.clone(),
            temperature_score,
            sampling_frequency_hours: sampling_hours,
            numerical_data: features,
            cloud_vision_data,
            ml_confidence: analysis.as_ref().map(|a| a.ml_confidence).unwrap_or(0.0),
            data_source,
            processing_time_ms,
            nyc_uuid: state.external_id.clone(),
            image_size_bytes: state.image_size_bytes,
            processing_error: state.processing_error.clone(),
            pipeline_status,
        };

        let stored = self
            .deps
            .analyses
            .insert(&record)
            .await
            .map_err(|e| persistence_error(format!("analysis insert failed: {}", e), pipeline_status))?;

        let update = ScheduleUpdate::new(temperature_score, sampling_hours);
        self.deps
            .schedules
            .update_by_id(&camera.camera_id, &update)
            .await
            .map_err(|e| {
                logger.log_warning(&format!("analysis {} written without schedule update", stored.id));
                persistence_error(format!("schedule update failed: {}", e), pipeline_status)
            })?;
        state.succeed(PipelineStep::Storage, &stored.id);

        logger.log_completion(
            temperature_score,
            data_source.as_str(),
            &pipeline_status,
            processing_time_ms,
        );

        Ok(PipelineResult {
            success: true,
            camera_id: camera.camera_id.clone(),
            zone_id: camera.zone_id.clone(),
            temperature_score,
            analysis_results: AnalysisResults::from_option(analysis.map(|mut a| {
                a.numerical_data = record.numerical_data;
                a
            })),
            processing_pipeline: pipeline_status,
            processing_error: record.processing_error,
            debug_info: DebugInfo {
                nyc_uuid: record.nyc_uuid,
                image_size_bytes: record.image_size_bytes,
                processing_time_ms,
                vision_api_enabled: self.deps.classifier.is_enabled(),
                data_source,
            },
            analysis_id: stored.id,
        })
    }

    /// Score real features, or fall back to a synthetic vector and the
    /// baseline score. The returned vector is the one persisted and echoed
    /// in the response, so a scorer failure replaces the classifier's.
    fn derive_score(
        &self,
        state: &mut RunState<'_>,
        camera: &CameraRecord,
        analysis: Option<&VisionAnalysis>,
        sampling_hours: f64,
    ) -> (f64, FeatureVector) {
        let Some(analysis) = analysis else {
            state.succeed(PipelineStep::TemperatureCalculation, "baseline score");
            return (FALLBACK_SCORE, synthetic_features());
        };

        match self.scorer.score(&analysis.numerical_data, camera, sampling_hours) {
            Ok(breakdown) => {
                if (breakdown.recommended_sampling_hours - sampling_hours).abs() > f64::EPSILON {
                    state.logger.log_warning(&format!(
                        "recommended cadence {:.2}h differs from persisted {}h; keeping persisted",
                        breakdown.recommended_sampling_hours, sampling_hours
                    ));
                }
                state.succeed(
                    PipelineStep::TemperatureCalculation,
                    &format!("score {:.2}", breakdown.total_score),
                );
                (breakdown.total_score, analysis.numerical_data)
            }
            Err(e) => {
                state.fail(PipelineStep::TemperatureCalculation, &PipelineError::Scoring(e));
                (FALLBACK_SCORE, synthetic_features())
            }
        }
    }
}

fn persistence_error(cause: String, mut pipeline_status: PipelineStatus) -> PipelineError {
    pipeline_status.set(PipelineStep::Storage, StepStatus::Failed);
    PipelineError::Persistence {
        cause,
        pipeline_status,
    }
}

/// Conservative stand-in features, each in `0..=2`.
pub fn synthetic_features() -> FeatureVector {
    let mut rng = rand::rng();
    let mut values = [0u8; FEATURE_COUNT];
    for v in values.iter_mut() {
        *v = rng.random_range(0..=SYNTHETIC_MAX);
    }
    FeatureVector::clamped(values)
}

/// Per-run accumulator. Only the first processing error is kept.
struct RunState<'a> {
    logger: &'a RunLogger,
    status: PipelineStatus,
    processing_error: Option<String>,
    external_id: Option<String>,
    image_size_bytes: u64,
}

impl<'a> RunState<'a> {
    fn new(logger: &'a RunLogger) -> Self {
        Self {
            logger,
            status: PipelineStatus::default(),
            processing_error: None,
            external_id: None,
            image_size_bytes: 0,
        }
    }

    fn succeed(&mut self, step: PipelineStep, detail: &str) {
        self.status.set(step, StepStatus::Success);
        self.logger.log_step(step, StepStatus::Success, detail);
    }

    fn fail(&mut self, step: PipelineStep, error: &PipelineError) {
        let message = error.processing_message();
        self.status.set(step, StepStatus::Failed);
        self.logger.log_step(step, StepStatus::Failed, &message);
        record_step_failure(step);
        if self.processing_error.is_none() {
            self.processing_error = Some(message);
        }
    }

    /// Mark a step failed because an upstream step produced nothing.
    fn skip(&mut self, step: PipelineStep) {
        self.status.set(step, StepStatus::Failed);
        self.logger.log_step(step, StepStatus::Failed, "skipped after upstream failure");
    }

    fn data_source(&self) -> DataSource {
        if self.processing_error.is_none() {
            DataSource::LiveCamera
        } else {
            DataSource::ErrorFallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_features_bounded() {
        for _ in 0..50 {
            let features = synthetic_features();
            assert!(features.values().iter().all(|v| *v <= SYNTHETIC_MAX));
        }
    }

    #[test]
    fn test_persistence_error_marks_storage_failed() {
        let mut status = PipelineStatus::default();
        status.set(PipelineStep::Storage, StepStatus::Success);
        match persistence_error("boom".to_string(), status) {
            PipelineError::Persistence { pipeline_status, .. } => {
                assert_eq!(pipeline_status.step_6_storage, StepStatus::Failed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
