//! Personal-record engine.
//!
//! Given the sets of one freshly saved workout, computes the best value per
//! exercise for its primary metric (repetitions, or time for hold exercises)
//! and for added weight, then offers each positive value to the record store.

use crate::catalog::ExerciseLookup;
use crate::record_store::RecordStore;
use crate::{
    Error, MetricType, RecordCandidate, RecordKey, RecordOutcome, Result, WorkoutSet,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// What one engine run did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordUpdateReport {
    /// One outcome per metric offered to the store, in exercise id order
    pub outcomes: Vec<RecordOutcome>,
    /// Exercise ids the catalog did not know; their sets were ignored
    pub skipped_exercises: Vec<String>,
}

impl RecordUpdateReport {
    /// Outcomes that created or improved a record
    pub fn new_bests(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| o.is_new_best())
    }
}

/// Best values observed for one exercise within a workout
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupMaxima {
    pub metric: MetricType,
    pub max_value: f64,
    pub max_weight: f64,
}

/// Maximum of the primary metric and of weight across a group of sets
pub fn group_maxima<'a>(
    metric: MetricType,
    sets: impl IntoIterator<Item = &'a WorkoutSet>,
) -> GroupMaxima {
    let mut max_value = 0.0_f64;
    let mut max_weight = 0.0_f64;
    for set in sets {
        max_value = max_value.max(set.metric_value(metric));
        max_weight = max_weight.max(set.metric_value(MetricType::Weight));
    }
    GroupMaxima {
        metric,
        max_value,
        max_weight,
    }
}

/// Update the user's personal records from the sets of one saved workout
///
/// ## Steps
///
/// 1. Resolve the quantification type of every distinct exercise in one lookup
/// 2. Group sets by exercise
/// 3. Per group, offer the best primary value (if > 0) and the best weight
///    (if > 0) to the store
///
/// Exercises unknown to the catalog are skipped. Any lookup or store error
/// aborts the run and is returned; records already written stay written.
pub fn update_personal_records<C, S>(
    catalog: &C,
    store: &S,
    sets: &[WorkoutSet],
    workout_id: Uuid,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<RecordUpdateReport>
where
    C: ExerciseLookup + ?Sized,
    S: RecordStore + ?Sized,
{
    if sets.is_empty() {
        return Err(Error::Validation("no sets to derive records from".into()));
    }
    if user_id.trim().is_empty() {
        return Err(Error::Validation("user id must not be empty".into()));
    }

    let mut groups: BTreeMap<&str, Vec<&WorkoutSet>> = BTreeMap::new();
    for set in sets {
        groups.entry(set.exercise_id.as_str()).or_default().push(set);
    }

    let ids: BTreeSet<&str> = groups.keys().copied().collect();
    let quantifications = catalog.quantification_types(&ids)?;

    let mut report = RecordUpdateReport::default();

    for (exercise_id, group) in groups {
        let Some(quantification) = quantifications.get(exercise_id) else {
            tracing::debug!("Exercise '{}' not in catalog, skipping its sets", exercise_id);
            report.skipped_exercises.push(exercise_id.to_string());
            continue;
        };

        let maxima = group_maxima(quantification.primary_metric(), group.iter().copied());

        let mut offer = |metric: MetricType, value: f64| -> Result<()> {
            let candidate = RecordCandidate {
                key: RecordKey {
                    user_id: user_id.to_string(),
                    exercise_id: exercise_id.to_string(),
                    metric,
                },
                value,
                workout_id,
            };
            let outcome = store.upsert(&candidate, now)?;
            match &outcome {
                RecordOutcome::Created(record) => tracing::info!(
                    "New {} record for {}: {}",
                    metric,
                    exercise_id,
                    record.value
                ),
                RecordOutcome::Updated {
                    previous_value,
                    record,
                } => tracing::info!(
                    "Improved {} record for {}: {} -> {}",
                    metric,
                    exercise_id,
                    previous_value,
                    record.value
                ),
                RecordOutcome::Unchanged(_) => {}
            }
            report.outcomes.push(outcome);
            Ok(())
        };

        if maxima.max_value > 0.0 {
            offer(maxima.metric, maxima.max_value)?;
        }
        if maxima.max_weight > 0.0 {
            offer(MetricType::Weight, maxima.max_weight)?;
        }
    }

    tracing::debug!(
        "Record update for workout {}: {} outcomes, {} skipped exercises",
        workout_id,
        report.outcomes.len(),
        report.skipped_exercises.len()
    );

    Ok(report)
}
