//! Core domain types for the Calisthénie Tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and how they are quantified
//! - Workouts and the sets they contain
//! - Personal records and the outcome of updating one

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// How performance on an exercise is measured
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuantificationType {
    /// Counted in repetitions (push-ups, pull-ups...)
    Repetition,
    /// Held for a duration (plank, L-sit...)
    Hold,
}

impl QuantificationType {
    /// The primary metric tracked for exercises of this type
    pub fn primary_metric(self) -> MetricType {
        match self {
            QuantificationType::Repetition => MetricType::Repetitions,
            QuantificationType::Hold => MetricType::Time,
        }
    }
}

/// Movement family of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Push,
    Pull,
    Legs,
    Core,
    Skill,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 5] = [
        ExerciseCategory::Push,
        ExerciseCategory::Pull,
        ExerciseCategory::Legs,
        ExerciseCategory::Core,
        ExerciseCategory::Skill,
    ];
}

impl FromStr for ExerciseCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(ExerciseCategory::Push),
            "pull" => Ok(ExerciseCategory::Pull),
            "legs" => Ok(ExerciseCategory::Legs),
            "core" => Ok(ExerciseCategory::Core),
            "skill" => Ok(ExerciseCategory::Skill),
            other => Err(crate::Error::Validation(format!(
                "Unknown exercise category '{}'",
                other
            ))),
        }
    }
}

/// An exercise definition (e.g., "Pull-up")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: ExerciseCategory,
    /// Difficulty rank from 1 (beginner) to 10 (elite)
    pub difficulty: u8,
    pub quantification: QuantificationType,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// Workout Types
// ============================================================================

/// A single set within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub exercise_id: String,
    #[serde(default)]
    pub repetitions: u32,
    /// Added load in kilograms
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub rest_seconds: u32,
}

impl WorkoutSet {
    /// Value of the given metric for this set; missing values count as zero
    pub fn metric_value(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Repetitions => f64::from(self.repetitions),
            MetricType::Time => f64::from(self.duration_seconds.unwrap_or(0)),
            MetricType::Weight => self.weight.unwrap_or(0.0),
        }
    }
}

/// A recorded training session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: String,
    pub performed_at: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub sets: Vec<WorkoutSet>,
}

// ============================================================================
// Personal Record Types
// ============================================================================

/// Metric a personal record is tracked on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Repetitions,
    Time,
    Weight,
}

impl MetricType {
    /// Whether `new` beats `old` for this metric
    ///
    /// Time records are won by the lower value; repetitions and weight by the
    /// higher one. Ties never count as an improvement.
    pub fn improves(self, new: f64, old: f64) -> bool {
        match self {
            MetricType::Time => new < old,
            MetricType::Repetitions | MetricType::Weight => new > old,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Repetitions => "repetitions",
            MetricType::Time => "time",
            MetricType::Weight => "weight",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "repetitions" | "reps" => Ok(MetricType::Repetitions),
            "time" | "duration" => Ok(MetricType::Time),
            "weight" => Ok(MetricType::Weight),
            other => Err(crate::Error::Validation(format!(
                "Unknown metric '{}'",
                other
            ))),
        }
    }
}

/// Identity of a personal record: at most one record exists per key
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub user_id: String,
    pub exercise_id: String,
    pub metric: MetricType,
}

/// Best-ever value for one (user, exercise, metric)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub user_id: String,
    pub exercise_id: String,
    pub metric: MetricType,
    pub value: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub workout_id: Option<Uuid>,
}

impl PersonalRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            user_id: self.user_id.clone(),
            exercise_id: self.exercise_id.clone(),
            metric: self.metric,
        }
    }
}

/// A value observed in a freshly logged workout, offered to the record store
#[derive(Clone, Debug, PartialEq)]
pub struct RecordCandidate {
    pub key: RecordKey,
    pub value: f64,
    pub workout_id: Uuid,
}

/// What an upsert did to the stored record
#[derive(Clone, Debug, PartialEq)]
pub enum RecordOutcome {
    /// No record existed for the key; this one was inserted
    Created(PersonalRecord),
    /// The candidate beat the stored value; the record was updated in place
    Updated {
        previous_value: f64,
        record: PersonalRecord,
    },
    /// The candidate did not beat the stored value; the record is untouched
    Unchanged(PersonalRecord),
}

impl RecordOutcome {
    pub fn record(&self) -> &PersonalRecord {
        match self {
            RecordOutcome::Created(record) => record,
            RecordOutcome::Updated { record, .. } => record,
            RecordOutcome::Unchanged(record) => record,
        }
    }

    /// True for created and updated outcomes
    pub fn is_new_best(&self) -> bool {
        !matches!(self, RecordOutcome::Unchanged(_))
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete catalog of exercises
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
}
