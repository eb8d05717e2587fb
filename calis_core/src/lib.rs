#![forbid(unsafe_code)]

//! Core domain model and business logic for the Calisthénie Tracker.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, sets, personal records)
//! - Exercise catalog
//! - Workout log persistence (JSONL)
//! - Record store and personal-record engine
//! - Progress series and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod workout_log;
pub mod record_store;
pub mod records;
pub mod workouts;
pub mod progress;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, ExerciseLookup};
pub use config::Config;
pub use workout_log::{JsonlWorkoutLog, WorkoutSink};
pub use record_store::{FileRecordStore, MemoryRecordStore, RecordStore};
pub use records::{update_personal_records, RecordUpdateReport};
pub use workouts::{list_personal_records, log_workout, LoggedWorkout, NewWorkout, RecordView};
pub use progress::{progress_series, summarize, ProgressPoint, TrainingSummary};
