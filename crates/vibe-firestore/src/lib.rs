//! Firestore REST API client.
//!
//! This crate provides:
//! - Schedule repository for monitored cameras
//! - Append-only analysis repository
//! - Service account authentication via gcp_auth (or the emulator token)
//! - Masked commits with server timestamps and preconditions
//! - Retry logic for read paths

pub mod analysis_repo;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod schedule_repo;
pub mod token_cache;
pub mod types;


pub use analysis_repo::{AnalysisRepository, ANALYSES_COLLECTION};
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::RetryConfig;
pub use schedule_repo::{ScheduleRepository, SCHEDULES_COLLECTION};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
