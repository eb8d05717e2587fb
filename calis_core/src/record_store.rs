//! Personal-record persistence.
//!
//! A record store answers point lookups by (user, exercise, metric), lists a
//! user's records, and applies a candidate value as a single atomic
//! lookup-compare-write so two workouts logged at the same time cannot lose
//! a legitimate record.

use crate::{Error, PersonalRecord, RecordCandidate, RecordKey, RecordOutcome, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Storage backend for personal records
pub trait RecordStore {
    /// Record for the exact (user, exercise, metric) triple, if any
    fn find(&self, key: &RecordKey) -> Result<Option<PersonalRecord>>;

    /// Every record held by a user, in no particular order
    fn for_user(&self, user_id: &str) -> Result<Vec<PersonalRecord>>;

    /// Offer a candidate value; create, improve or leave the record atomically
    fn upsert(&self, candidate: &RecordCandidate, now: DateTime<Utc>) -> Result<RecordOutcome>;
}

/// Decide what an upsert does given the currently stored record
///
/// - No record: a new one is created at `now`.
/// - Strict improvement for the metric: value, date and workout are replaced
///   in place, keeping the record id.
/// - Otherwise (including ties): the stored record is returned untouched.
pub fn resolve_upsert(
    existing: Option<&PersonalRecord>,
    candidate: &RecordCandidate,
    now: DateTime<Utc>,
) -> RecordOutcome {
    match existing {
        None => RecordOutcome::Created(PersonalRecord {
            id: Uuid::new_v4(),
            user_id: candidate.key.user_id.clone(),
            exercise_id: candidate.key.exercise_id.clone(),
            metric: candidate.key.metric,
            value: candidate.value,
            date: now,
            workout_id: Some(candidate.workout_id),
        }),
        Some(current) if candidate.key.metric.improves(candidate.value, current.value) => {
            let mut record = current.clone();
            record.value = candidate.value;
            record.date = now;
            record.workout_id = Some(candidate.workout_id);
            RecordOutcome::Updated {
                previous_value: current.value,
                record,
            }
        }
        Some(current) => RecordOutcome::Unchanged(current.clone()),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<RecordKey, PersonalRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, replacing any record with the same key
    pub fn insert(&self, record: PersonalRecord) -> Result<()> {
        self.lock()?.insert(record.key(), record);
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<RecordKey, PersonalRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::Store("record store mutex poisoned".into()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn find(&self, key: &RecordKey) -> Result<Option<PersonalRecord>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn for_user(&self, user_id: &str) -> Result<Vec<PersonalRecord>> {
        Ok(self
            .lock()?
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn upsert(&self, candidate: &RecordCandidate, now: DateTime<Utc>) -> Result<RecordOutcome> {
        let mut records = self.lock()?;
        let outcome = resolve_upsert(records.get(&candidate.key), candidate, now);
        if outcome.is_new_best() {
            let record = outcome.record().clone();
            records.insert(record.key(), record);
        }
        Ok(outcome)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// On-disk layout of the record file
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default)]
    records: Vec<PersonalRecord>,
}

/// JSON file store guarded by an advisory lock on a sidecar lock file
///
/// Upserts hold the exclusive lock across read, compare and write; the file
/// itself is replaced through a temp file and rename.
pub struct FileRecordStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("json.lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?)
    }

    /// Run `f` on the current contents while holding a shared lock
    fn with_shared<T>(&self, f: impl FnOnce(RecordFile) -> T) -> Result<T> {
        if !self.path.exists() {
            return Ok(f(RecordFile::default()));
        }
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let loaded = self.load();
        lock.unlock()?;
        Ok(f(loaded?))
    }

    /// Unlocked read; callers hold the lock
    fn load(&self) -> Result<RecordFile> {
        if !self.path.exists() {
            return Ok(RecordFile::default());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(RecordFile::default());
        }

        serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!("corrupt record file {:?}: {}", self.path, e))
        })
    }

    /// Unlocked atomic write; callers hold the exclusive lock
    fn save(&self, file: &RecordFile) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Store(format!("record path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, file)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn matches_key(record: &PersonalRecord, key: &RecordKey) -> bool {
    record.user_id == key.user_id
        && record.exercise_id == key.exercise_id
        && record.metric == key.metric
}

impl RecordStore for FileRecordStore {
    fn find(&self, key: &RecordKey) -> Result<Option<PersonalRecord>> {
        self.with_shared(|file| {
            file.records.into_iter().find(|r| matches_key(r, key))
        })
    }

    fn for_user(&self, user_id: &str) -> Result<Vec<PersonalRecord>> {
        self.with_shared(|file| {
            file.records
                .into_iter()
                .filter(|r| r.user_id == user_id)
                .collect()
        })
    }

    fn upsert(&self, candidate: &RecordCandidate, now: DateTime<Utc>) -> Result<RecordOutcome> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<RecordOutcome> {
            let mut file = self.load()?;
            let position = file
                .records
                .iter()
                .position(|r| matches_key(r, &candidate.key));

            let outcome = resolve_upsert(position.map(|i| &file.records[i]), candidate, now);
            match (&outcome, position) {
                (RecordOutcome::Created(record), _) => {
                    file.records.push(record.clone());
                    self.save(&file)?;
                }
                (RecordOutcome::Updated { record, .. }, Some(i)) => {
                    file.records[i] = record.clone();
                    self.save(&file)?;
                }
                _ => {}
            }
            Ok(outcome)
        })();

        lock.unlock()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricType;
    use chrono::Duration;
    use std::sync::Arc;

    fn candidate(metric: MetricType, value: f64, workout_id: Uuid) -> RecordCandidate {
        RecordCandidate {
            key: RecordKey {
                user_id: "u1".into(),
                exercise_id: "pullup".into(),
                metric,
            },
            value,
            workout_id,
        }
    }

    #[test]
    fn test_resolve_creates_when_missing() {
        let now = Utc::now();
        let workout = Uuid::new_v4();
        let outcome = resolve_upsert(None, &candidate(MetricType::Repetitions, 10.0, workout), now);
        match outcome {
            RecordOutcome::Created(record) => {
                assert_eq!(record.value, 10.0);
                assert_eq!(record.date, now);
                assert_eq!(record.workout_id, Some(workout));
            }
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_tie_is_unchanged() {
        let earlier = Utc::now() - Duration::days(3);
        let original_workout = Uuid::new_v4();
        let existing = match resolve_upsert(
            None,
            &candidate(MetricType::Repetitions, 10.0, original_workout),
            earlier,
        ) {
            RecordOutcome::Created(r) => r,
            _ => unreachable!(),
        };

        let outcome = resolve_upsert(
            Some(&existing),
            &candidate(MetricType::Repetitions, 10.0, Uuid::new_v4()),
            Utc::now(),
        );
        assert_eq!(outcome, RecordOutcome::Unchanged(existing.clone()));
        assert_eq!(outcome.record().date, earlier);
        assert_eq!(outcome.record().workout_id, Some(original_workout));
    }

    #[test]
    fn test_resolve_update_keeps_record_id() {
        let existing = match resolve_upsert(
            None,
            &candidate(MetricType::Time, 45.0, Uuid::new_v4()),
            Utc::now() - Duration::days(1),
        ) {
            RecordOutcome::Created(r) => r,
            _ => unreachable!(),
        };

        let outcome = resolve_upsert(
            Some(&existing),
            &candidate(MetricType::Time, 30.0, Uuid::new_v4()),
            Utc::now(),
        );
        match outcome {
            RecordOutcome::Updated {
                previous_value,
                record,
            } => {
                assert_eq!(previous_value, 45.0);
                assert_eq!(record.value, 30.0);
                assert_eq!(record.id, existing.id);
            }
            other => panic!("expected Updated, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_store_upsert_sequence() {
        let store = MemoryRecordStore::new();
        let now = Utc::now();

        let first = store
            .upsert(&candidate(MetricType::Repetitions, 10.0, Uuid::new_v4()), now)
            .unwrap();
        assert!(matches!(first, RecordOutcome::Created(_)));

        let worse = store
            .upsert(&candidate(MetricType::Repetitions, 8.0, Uuid::new_v4()), now)
            .unwrap();
        assert!(matches!(worse, RecordOutcome::Unchanged(_)));

        let better = store
            .upsert(&candidate(MetricType::Repetitions, 12.0, Uuid::new_v4()), now)
            .unwrap();
        assert!(matches!(better, RecordOutcome::Updated { .. }));

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.for_user("u1").unwrap()[0].value, 12.0);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        let key = candidate(MetricType::Weight, 20.0, Uuid::new_v4()).key;

        FileRecordStore::new(&path)
            .upsert(&candidate(MetricType::Weight, 20.0, Uuid::new_v4()), Utc::now())
            .unwrap();

        let reopened = FileRecordStore::new(&path);
        let found = reopened.find(&key).unwrap().unwrap();
        assert_eq!(found.value, 20.0);
        assert_eq!(reopened.for_user("u1").unwrap().len(), 1);
        assert!(reopened.for_user("someone_else").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_unchanged_does_not_rewrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        let store = FileRecordStore::new(&path);

        store
            .upsert(&candidate(MetricType::Repetitions, 10.0, Uuid::new_v4()), Utc::now())
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let outcome = store
            .upsert(&candidate(MetricType::Repetitions, 9.0, Uuid::new_v4()), Utc::now())
            .unwrap();
        assert!(matches!(outcome, RecordOutcome::Unchanged(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(temp_dir.path().join("records.json"));
        assert!(store.for_user("u1").unwrap().is_empty());
        assert!(store
            .find(&candidate(MetricType::Time, 1.0, Uuid::new_v4()).key)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileRecordStore::new(&path);
        let result = store.upsert(
            &candidate(MetricType::Repetitions, 5.0, Uuid::new_v4()),
            Utc::now(),
        );
        assert!(matches!(result, Err(Error::Store(_))));
        // The corrupt file is left for manual recovery
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_concurrent_upserts_keep_the_best_value() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        let store = Arc::new(FileRecordStore::new(&path));

        std::thread::scope(|scope| {
            for reps in 1..=16u32 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    store
                        .upsert(
                            &candidate(MetricType::Repetitions, f64::from(reps), Uuid::new_v4()),
                            Utc::now(),
                        )
                        .unwrap();
                });
            }
        });

        let records = store.for_user("u1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 16.0);
    }
}
