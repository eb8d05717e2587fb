use calis_core::config::{records_path, workouts_path};
use calis_core::export::export_sets_csv;
use calis_core::workout_log::workouts_for_user;
use calis_core::*;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "calis")]
#[command(about = "Calisthenics workout log and personal-record tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user instead of the configured default
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout and update personal records
    Log {
        /// A set: exercise=ID,reps=N[,weight=KG][,duration=S][,rest=S] (repeatable)
        #[arg(long = "set", value_name = "SET")]
        sets: Vec<String>,

        /// Read the workout from a JSON file instead of --set
        #[arg(long, conflicts_with = "sets")]
        from_file: Option<PathBuf>,

        /// Workout title
        #[arg(long)]
        name: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List personal records, newest first
    Records {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the exercise catalog
    Exercises {
        /// Only show one category (push, pull, legs, core, skill)
        #[arg(long)]
        category: Option<String>,
    },

    /// Show the per-workout progression of one exercise
    Progress {
        #[arg(long)]
        exercise: String,

        /// repetitions, time or weight (defaults to the exercise's primary metric)
        #[arg(long)]
        metric: Option<String>,
    },

    /// Export logged sets to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Show training volume totals
    Summary,
}

fn main() -> Result<()> {
    calis_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli
        .user
        .unwrap_or_else(|| config.user.default_user.clone());
    tracing::debug!("Using data directory {:?} as user '{}'", data_dir, user);

    let catalog = get_default_catalog().with_custom(&config.catalog.custom);
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    match cli.command {
        Commands::Log {
            sets,
            from_file,
            name,
            notes,
        } => cmd_log(&data_dir, &catalog, &user, sets, from_file, name, notes),
        Commands::Records { json } => cmd_records(&data_dir, &catalog, &user, json),
        Commands::Exercises { category } => cmd_exercises(&catalog, category),
        Commands::Progress { exercise, metric } => {
            cmd_progress(&data_dir, &catalog, &user, &exercise, metric)
        }
        Commands::Export { out } => cmd_export(&data_dir, &user, &out),
        Commands::Summary => cmd_summary(&data_dir, &catalog, &user),
    }
}

fn cmd_log(
    data_dir: &Path,
    catalog: &Catalog,
    user: &str,
    sets: Vec<String>,
    from_file: Option<PathBuf>,
    name: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let mut new = match from_file {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str::<NewWorkout>(&contents)?
        }
        None => NewWorkout {
            sets: sets
                .iter()
                .map(|s| parse_set(s))
                .collect::<Result<Vec<_>>>()?,
            ..Default::default()
        },
    };
    if name.is_some() {
        new.name = name;
    }
    if notes.is_some() {
        new.notes = notes;
    }

    std::fs::create_dir_all(data_dir)?;
    let mut sink = JsonlWorkoutLog::new(workouts_path(data_dir));
    let store = FileRecordStore::new(records_path(data_dir));

    let logged = log_workout(catalog, &mut sink, &store, user, new, chrono::Utc::now())?;

    println!(
        "✓ Workout logged ({} sets) [{}]",
        logged.workout.sets.len(),
        logged.workout.id
    );

    match logged.records {
        Some(report) => {
            for outcome in report.new_bests() {
                let record = outcome.record();
                let exercise = catalog
                    .get(&record.exercise_id)
                    .map(|e| e.name.as_str())
                    .unwrap_or(record.exercise_id.as_str());
                match outcome {
                    RecordOutcome::Updated { previous_value, .. } => println!(
                        "  ★ New record: {} {} {} (was {})",
                        exercise,
                        format_value(record.metric, record.value),
                        record.metric,
                        format_value(record.metric, *previous_value)
                    ),
                    _ => println!(
                        "  ★ First record: {} {} {}",
                        exercise,
                        format_value(record.metric, record.value),
                        record.metric
                    ),
                }
            }
        }
        None => println!("  (personal records could not be updated this time)"),
    }

    Ok(())
}

fn cmd_records(data_dir: &Path, catalog: &Catalog, user: &str, json: bool) -> Result<()> {
    let store = FileRecordStore::new(records_path(data_dir));
    let workouts = workouts_for_user(&workouts_path(data_dir), user)?;
    let views = list_personal_records(&store, catalog, &workouts, user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No personal records yet.");
        return Ok(());
    }

    for view in &views {
        let exercise = view
            .exercise
            .as_ref()
            .map(|e| e.name.as_str())
            .unwrap_or(view.record.exercise_id.as_str());
        println!(
            "{}  {:<28} {:<12} {}",
            view.record.date.format("%Y-%m-%d"),
            exercise,
            view.record.metric,
            format_value(view.record.metric, view.record.value)
        );
    }
    Ok(())
}

fn cmd_exercises(catalog: &Catalog, category: Option<String>) -> Result<()> {
    let exercises = match category {
        Some(c) => catalog.filter_by_category(c.parse::<ExerciseCategory>()?),
        None => catalog.sorted(),
    };

    for exercise in exercises {
        println!(
            "{:<20} {:<28} {:<6} {:>2}/10  {:?}",
            exercise.id,
            exercise.name,
            format!("{:?}", exercise.category).to_lowercase(),
            exercise.difficulty,
            exercise.quantification
        );
    }
    Ok(())
}

fn cmd_progress(
    data_dir: &Path,
    catalog: &Catalog,
    user: &str,
    exercise_id: &str,
    metric: Option<String>,
) -> Result<()> {
    let exercise = catalog
        .get(exercise_id)
        .ok_or_else(|| Error::Validation(format!("unknown exercise '{}'", exercise_id)))?;
    let metric = match metric {
        Some(m) => m.parse::<MetricType>()?,
        None => exercise.quantification.primary_metric(),
    };

    let workouts = workouts_for_user(&workouts_path(data_dir), user)?;
    let series = progress_series(&workouts, exercise_id, metric);

    if series.is_empty() {
        println!("No {} logged for {} yet.", metric, exercise.name);
        return Ok(());
    }

    println!("{} ({})", exercise.name, metric);
    let best = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    for point in &series {
        let width = if best > 0.0 {
            ((point.value / best) * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "  {}  {:>8}  {}",
            point.date.format("%Y-%m-%d"),
            format_value(metric, point.value),
            "█".repeat(width)
        );
    }
    Ok(())
}

fn cmd_export(data_dir: &Path, user: &str, out: &Path) -> Result<()> {
    let mut workouts = workouts_for_user(&workouts_path(data_dir), user)?;
    workouts.reverse();
    let rows = export_sets_csv(&workouts, out)?;
    println!("✓ Exported {} sets", rows);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn cmd_summary(data_dir: &Path, catalog: &Catalog, user: &str) -> Result<()> {
    let workouts = workouts_for_user(&workouts_path(data_dir), user)?;
    let summary = summarize(&workouts, catalog, user);

    println!("Workouts:        {}", summary.workouts);
    println!("Sets:            {}", summary.sets);
    println!("Repetitions:     {}", summary.total_repetitions);
    println!("Hold time:       {}s", summary.total_hold_seconds);
    if let (Some(first), Some(last)) = (summary.first_workout, summary.last_workout) {
        println!(
            "Period:          {} → {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Parse `exercise=ID,reps=N,weight=KG,duration=S,rest=S`
///
/// A leading bare token is taken as the exercise id (`pullup,reps=8`).
fn parse_set(raw: &str) -> Result<WorkoutSet> {
    let mut set = WorkoutSet {
        exercise_id: String::new(),
        repetitions: 0,
        weight: None,
        duration_seconds: None,
        rest_seconds: 0,
    };

    for (index, part) in raw.split(',').map(str::trim).enumerate() {
        if part.is_empty() {
            continue;
        }
        let (key, value) = match part.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None if index == 0 => ("exercise", part),
            None => {
                return Err(Error::Validation(format!(
                    "set '{}': expected key=value, got '{}'",
                    raw, part
                )))
            }
        };

        let invalid = |what: &str| {
            Error::Validation(format!("set '{}': invalid {} '{}'", raw, what, value))
        };

        match key {
            "exercise" | "ex" => set.exercise_id = value.to_string(),
            "reps" | "repetitions" => {
                set.repetitions = value.parse().map_err(|_| invalid("reps"))?
            }
            "weight" | "kg" => set.weight = Some(value.parse().map_err(|_| invalid("weight"))?),
            "duration" | "time" => {
                set.duration_seconds = Some(value.parse().map_err(|_| invalid("duration"))?)
            }
            "rest" => set.rest_seconds = value.parse().map_err(|_| invalid("rest"))?,
            other => {
                return Err(Error::Validation(format!(
                    "set '{}': unknown field '{}'",
                    raw, other
                )))
            }
        }
    }

    Ok(set)
}

fn format_value(metric: MetricType, value: f64) -> String {
    match metric {
        MetricType::Repetitions => format!("{}", value as u64),
        MetricType::Time => format!("{}s", value as u64),
        MetricType::Weight => format!("{}kg", value),
    }
}
