//! Append-only workout log.
//!
//! Workouts are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.

use crate::{Result, Workout};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Workout sink trait for persisting workouts
pub trait WorkoutSink {
    fn append(&mut self, workout: &Workout) -> Result<()>;
}

/// JSONL-based workout log with file locking
pub struct JsonlWorkoutLog {
    path: PathBuf,
}

impl JsonlWorkoutLog {
    /// Create a new JSONL log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutSink for JsonlWorkoutLog {
    fn append(&mut self, workout: &Workout) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(workout)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        // The workout must be durable before records reference it
        file.sync_data()?;
        file.unlock()?;

        tracing::debug!(
            "Appended workout {} ({} sets) to log",
            workout.id,
            workout.sets.len()
        );
        Ok(())
    }
}

/// Read all workouts from a log file
pub fn read_workouts(path: &Path) -> Result<Vec<Workout>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut workouts = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Workout>(&line) {
            Ok(workout) => workouts.push(workout),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from log", workouts.len());
    Ok(workouts)
}

/// Workouts belonging to one user, newest first
pub fn workouts_for_user(path: &Path, user_id: &str) -> Result<Vec<Workout>> {
    let mut workouts: Vec<_> = read_workouts(path)?
        .into_iter()
        .filter(|w| w.user_id == user_id)
        .collect();
    workouts.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
    Ok(workouts)
}
