//! CSV export of logged sets.
//!
//! One row per set, suitable for spreadsheets or external charting.

use crate::{Result, Workout};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: String,
    performed_at: String,
    workout_name: Option<&'a str>,
    set_index: usize,
    exercise_id: &'a str,
    repetitions: u32,
    weight: Option<f64>,
    duration_seconds: Option<u32>,
    rest_seconds: u32,
}

/// Append every set of `workouts` to a CSV file
///
/// Headers are written only when the file is new or empty. The file is
/// synced before returning. Returns the number of rows written.
pub fn export_sets_csv(workouts: &[Workout], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut rows = 0;
    for workout in workouts {
        let performed_at = workout.performed_at.to_rfc3339();
        for (index, set) in workout.sets.iter().enumerate() {
            writer.serialize(CsvRow {
                workout_id: workout.id.to_string(),
                performed_at: performed_at.clone(),
                workout_name: workout.name.as_deref(),
                set_index: index + 1,
                exercise_id: &set.exercise_id,
                repetitions: set.repetitions,
                weight: set.weight,
                duration_seconds: set.duration_seconds,
                rest_seconds: set.rest_seconds,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets to {:?}", rows, csv_path);
    Ok(rows)
}
