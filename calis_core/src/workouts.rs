//! Workout logging and record listing.
//!
//! `log_workout` is the write path used by the front end: it validates the
//! submission, persists the workout, then updates personal records on a
//! best-effort basis. `list_personal_records` is the matching read path.

use crate::record_store::RecordStore;
use crate::records::{update_personal_records, RecordUpdateReport};
use crate::workout_log::WorkoutSink;
use crate::{
    Catalog, Error, ExerciseCategory, PersonalRecord, QuantificationType, Result, Workout,
    WorkoutSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A workout as submitted, before it has an id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewWorkout {
    /// Defaults to the time of logging
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub sets: Vec<WorkoutSet>,
}

/// Result of logging a workout
#[derive(Clone, Debug)]
pub struct LoggedWorkout {
    pub workout: Workout,
    /// `None` when record bookkeeping failed; the workout is saved regardless
    pub records: Option<RecordUpdateReport>,
}

fn validate(catalog: &Catalog, user_id: &str, new: &NewWorkout) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation("user id must not be empty".into()));
    }
    if new.sets.is_empty() {
        return Err(Error::Validation("a workout needs at least one set".into()));
    }

    for (index, set) in new.sets.iter().enumerate() {
        let position = index + 1;
        if set.exercise_id.trim().is_empty() {
            return Err(Error::Validation(format!(
                "set {}: exercise id must not be empty",
                position
            )));
        }
        if catalog.get(&set.exercise_id).is_none() {
            return Err(Error::Validation(format!(
                "set {}: unknown exercise '{}'",
                position, set.exercise_id
            )));
        }
        if let Some(weight) = set.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Validation(format!(
                    "set {}: weight must be a non-negative number, got {}",
                    position, weight
                )));
            }
        }
    }
    Ok(())
}

/// Validate, persist and derive records for a submitted workout
///
/// The workout is durably appended before the record engine runs. A failure
/// in the engine is logged and reported as `records: None`; it never turns a
/// saved workout into an error.
pub fn log_workout<W, S>(
    catalog: &Catalog,
    sink: &mut W,
    store: &S,
    user_id: &str,
    new: NewWorkout,
    now: DateTime<Utc>,
) -> Result<LoggedWorkout>
where
    W: WorkoutSink + ?Sized,
    S: RecordStore + ?Sized,
{
    validate(catalog, user_id, &new)?;

    let workout = Workout {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        performed_at: new.performed_at.unwrap_or(now),
        name: new.name,
        notes: new.notes,
        sets: new.sets,
    };

    sink.append(&workout)?;
    tracing::info!(
        "Logged workout {} for {} ({} sets)",
        workout.id,
        workout.user_id,
        workout.sets.len()
    );

    let records = match update_personal_records(
        catalog,
        store,
        &workout.sets,
        workout.id,
        &workout.user_id,
        now,
    ) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(
                "Personal records not updated for workout {}: {}",
                workout.id,
                e
            );
            None
        }
    };

    Ok(LoggedWorkout { workout, records })
}

/// Exercise fields shown next to a record
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseSummary {
    pub id: String,
    pub name: String,
    pub category: ExerciseCategory,
    pub quantification: QuantificationType,
}

/// Workout fields shown next to a record
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkoutSummary {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub name: Option<String>,
}

/// A personal record joined with its exercise and originating workout
#[derive(Clone, Debug, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: PersonalRecord,
    /// Missing when the exercise has since left the catalog
    pub exercise: Option<ExerciseSummary>,
    /// Missing when the record has no workout or the workout is gone
    pub workout: Option<WorkoutSummary>,
}

/// All records of a user with exercise and workout summaries, newest first
pub fn list_personal_records<S>(
    store: &S,
    catalog: &Catalog,
    workouts: &[Workout],
    user_id: &str,
) -> Result<Vec<RecordView>>
where
    S: RecordStore + ?Sized,
{
    let by_id: HashMap<Uuid, &Workout> = workouts.iter().map(|w| (w.id, w)).collect();

    let mut views: Vec<RecordView> = store
        .for_user(user_id)?
        .into_iter()
        .map(|record| {
            let exercise = catalog.get(&record.exercise_id).map(|e| ExerciseSummary {
                id: e.id.clone(),
                name: e.name.clone(),
                category: e.category,
                quantification: e.quantification,
            });
            let workout = record
                .workout_id
                .and_then(|id| by_id.get(&id))
                .map(|w| WorkoutSummary {
                    id: w.id,
                    performed_at: w.performed_at,
                    name: w.name.clone(),
                });
            RecordView {
                record,
                exercise,
                workout,
            }
        })
        .collect();

    views.sort_by(|a, b| b.record.date.cmp(&a.record.date));
    Ok(views)
}
