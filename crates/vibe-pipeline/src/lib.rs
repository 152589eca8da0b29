//! Camera analysis pipeline.
//!
//! This crate provides:
//! - Collaborator ports (schedule/analysis stores, resolver, image source, classifier)
//! - Identifier resolution against camera handles and a zone directory
//! - HTTP camera frame acquisition
//! - Adaptive temperature scoring
//! - The six-step orchestrator with its fallback policy
//! - In-memory and Firestore store implementations

pub mod acquire;
pub mod classifier;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod ports;
pub mod resolver;
pub mod scoring;
pub mod stores;

pub use acquire::HttpImageSource;
pub use classifier::VisionSceneClassifier;
pub use config::PipelineConfig;
pub use error::{PipelineError, RunResult};
pub use logging::RunLogger;
pub use orchestrator::{Collaborators, Orchestrator};
pub use ports::{
    AnalysisStore, CameraImage, IdentifierResolver, ImageSource, SceneClassifier, ScheduleStore, StoreError,
    StoreResult,
};
pub use resolver::{CameraDirectory, DirectoryResolver};
pub use scoring::{AdaptiveScorer, ScoreBreakdown, ScoringError, ScoringWeights};
pub use stores::{FirestoreAnalysisStore, FirestoreScheduleStore, MemoryAnalysisStore, MemoryScheduleStore};
