//! Integration tests for the calis binary.
//!
//! These tests verify end-to-end behavior including:
//! - Workout logging and personal-record derivation
//! - Record listing and JSON output
//! - Progress, export and summary commands
//! - Recovery from damaged data files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("calis"))
}

fn log_sets(data_dir: &std::path::Path, user: &str, sets: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cli();
    cmd.arg("log").arg("--data-dir").arg(data_dir).arg("--user").arg(user);
    for set in sets {
        cmd.arg("--set").arg(set);
    }
    cmd.assert()
}

fn records_json(data_dir: &std::path::Path, user: &str) -> Vec<serde_json::Value> {
    let output = cli()
        .arg("records")
        .arg("--json")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg(user)
        .output()
        .expect("Failed to run records");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("records --json should print JSON")
}

fn record_value(records: &[serde_json::Value], exercise: &str, metric: &str) -> Option<f64> {
    records
        .iter()
        .find(|r| r["exercise_id"] == exercise && r["metric"] == metric)
        .and_then(|r| r["value"].as_f64())
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("personal-record tracker"));
}

#[test]
fn test_log_creates_workout_and_records() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_sets(
        data_dir,
        "camille",
        &["pullup,reps=8", "pullup,reps=10,weight=5", "plank,duration=60"],
    )
    .success()
    .stdout(predicate::str::contains("Workout logged (3 sets)"))
    .stdout(predicate::str::contains("First record"));

    assert!(data_dir.join("workouts.jsonl").exists());
    assert!(data_dir.join("records.json").exists());

    let records = records_json(data_dir, "camille");
    assert_eq!(records.len(), 3);
    assert_eq!(record_value(&records, "pullup", "repetitions"), Some(10.0));
    assert_eq!(record_value(&records, "pullup", "weight"), Some(5.0));
    assert_eq!(record_value(&records, "plank", "time"), Some(60.0));
}

#[test]
fn test_records_only_move_on_strict_improvement() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_sets(data_dir, "u", &["pullup,reps=10", "plank,duration=45"]).success();
    // Fewer reps, longer hold: neither beats the stored record
    log_sets(data_dir, "u", &["pullup,reps=8", "plank,duration=60"])
        .success()
        .stdout(predicate::str::contains("New record").not());

    let records = records_json(data_dir, "u");
    assert_eq!(record_value(&records, "pullup", "repetitions"), Some(10.0));
    assert_eq!(record_value(&records, "plank", "time"), Some(45.0));

    // More reps, shorter hold: both replace the stored record
    log_sets(data_dir, "u", &["pullup,reps=12", "plank,duration=30"])
        .success()
        .stdout(predicate::str::contains("New record"));

    let records = records_json(data_dir, "u");
    assert_eq!(records.len(), 2);
    assert_eq!(record_value(&records, "pullup", "repetitions"), Some(12.0));
    assert_eq!(record_value(&records, "plank", "time"), Some(30.0));
}

#[test]
fn test_records_are_scoped_per_user() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_sets(data_dir, "alex", &["dip,reps=15"]).success();
    log_sets(data_dir, "sam", &["dip,reps=5"]).success();

    assert_eq!(record_value(&records_json(data_dir, "alex"), "dip", "repetitions"), Some(15.0));
    assert_eq!(record_value(&records_json(data_dir, "sam"), "dip", "repetitions"), Some(5.0));
}

#[test]
fn test_record_json_includes_workout_summary() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u")
        .arg("--name")
        .arg("Lundi")
        .arg("--set")
        .arg("squat,reps=40")
        .assert()
        .success();

    let records = records_json(data_dir, "u");
    assert_eq!(records[0]["workout"]["name"], "Lundi");
    assert_eq!(records[0]["exercise"]["name"], "Squats");
}

#[test]
fn test_unknown_exercise_is_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_sets(data_dir, "u", &["unicycle,reps=3"])
        .failure()
        .stderr(predicate::str::contains("unknown exercise"));

    assert!(!data_dir.join("workouts.jsonl").exists());
}

#[test]
fn test_log_without_sets_fails() {
    let temp_dir = setup_test_dir();
    log_sets(temp_dir.path(), "u", &[]).failure();
}

#[test]
fn test_log_from_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let workout_path = data_dir.join("workout.json");
    fs::write(
        &workout_path,
        r#"{"name":"Skills","sets":[{"exercise_id":"l_sit","duration_seconds":20},{"exercise_id":"handstand","duration_seconds":35,"rest_seconds":120}]}"#,
    )
    .unwrap();

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u")
        .arg("--from-file")
        .arg(&workout_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout logged (2 sets)"));

    let records = records_json(data_dir, "u");
    assert_eq!(record_value(&records, "handstand", "time"), Some(35.0));
}

#[test]
fn test_corrupt_record_file_does_not_fail_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    fs::write(data_dir.join("records.json"), "{ invalid json }}}").unwrap();

    log_sets(data_dir, "u", &["pushup,reps=20"])
        .success()
        .stdout(predicate::str::contains("Workout logged"))
        .stdout(predicate::str::contains("could not be updated"));

    let log = fs::read_to_string(data_dir.join("workouts.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn test_exercises_category_filter() {
    cli()
        .arg("exercises")
        .arg("--category")
        .arg("skill")
        .assert()
        .success()
        .stdout(predicate::str::contains("front_lever"))
        .stdout(predicate::str::contains("pullup").not());
}

#[test]
fn test_progress_lists_each_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_sets(data_dir, "u", &["pushup,reps=15"]).success();
    log_sets(data_dir, "u", &["pushup,reps=18", "pushup,reps=21"]).success();

    cli()
        .arg("progress")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u")
        .arg("--exercise")
        .arg("pushup")
        .assert()
        .success()
        .stdout(predicate::str::contains("15"))
        .stdout(predicate::str::contains("21"));
}

#[test]
fn test_export_and_summary() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let csv_path = data_dir.join("export").join("sets.csv");

    log_sets(data_dir, "u", &["pullup,reps=6", "plank,duration=40"]).success();

    cli()
        .arg("export")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u")
        .arg("--out")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 sets"));
    assert_eq!(fs::read_to_string(&csv_path).unwrap().lines().count(), 3);

    cli()
        .arg("summary")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts:        1"))
        .stdout(predicate::str::contains("Hold time:       40s"));
}
