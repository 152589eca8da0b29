//! Store port implementations.

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreAnalysisStore, FirestoreScheduleStore};
pub use memory::{MemoryAnalysisStore, MemoryScheduleStore};
