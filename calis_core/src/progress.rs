//! Progress series and training summaries.
//!
//! These back the progress charts: one point per workout for a given
//! exercise and metric, plus simple volume totals.

use crate::{Catalog, MetricType, QuantificationType, Workout};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Best value of a metric within one workout
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProgressPoint {
    pub workout_id: Uuid,
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// Per-workout best for an exercise and metric, oldest first
///
/// Workouts without a positive value for the metric are left out.
pub fn progress_series(
    workouts: &[Workout],
    exercise_id: &str,
    metric: MetricType,
) -> Vec<ProgressPoint> {
    let mut points: Vec<ProgressPoint> = workouts
        .iter()
        .filter_map(|workout| {
            let best = workout
                .sets
                .iter()
                .filter(|s| s.exercise_id == exercise_id)
                .map(|s| s.metric_value(metric))
                .fold(0.0_f64, f64::max);

            (best > 0.0).then(|| ProgressPoint {
                workout_id: workout.id,
                date: workout.performed_at,
                value: best,
            })
        })
        .collect();

    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// Volume totals over a user's workouts
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct TrainingSummary {
    pub workouts: usize,
    pub sets: usize,
    pub total_repetitions: u64,
    pub total_hold_seconds: u64,
    pub first_workout: Option<DateTime<Utc>>,
    pub last_workout: Option<DateTime<Utc>>,
}

/// Totals for one user; hold seconds only count hold exercises
pub fn summarize(workouts: &[Workout], catalog: &Catalog, user_id: &str) -> TrainingSummary {
    let mut summary = TrainingSummary::default();

    for workout in workouts.iter().filter(|w| w.user_id == user_id) {
        summary.workouts += 1;
        summary.sets += workout.sets.len();

        for set in &workout.sets {
            let is_hold = catalog
                .get(&set.exercise_id)
                .map(|e| e.quantification == QuantificationType::Hold)
                .unwrap_or(false);
            if is_hold {
                summary.total_hold_seconds += u64::from(set.duration_seconds.unwrap_or(0));
            } else {
                summary.total_repetitions += u64::from(set.repetitions);
            }
        }

        summary.first_workout = Some(match summary.first_workout {
            Some(first) => first.min(workout.performed_at),
            None => workout.performed_at,
        });
        summary.last_workout = Some(match summary.last_workout {
            Some(last) => last.max(workout.performed_at),
            None => workout.performed_at,
        });
    }

    summary
}
