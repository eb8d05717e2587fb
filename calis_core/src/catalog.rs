//! Default catalog of calisthenics exercises.
//!
//! This module provides the built-in exercises and the batched lookup the
//! personal-record engine uses to learn how each exercise is quantified.

use crate::config::CustomExercise;
use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Source of exercise metadata for a batch of ids
///
/// Ids the source does not know are left out of the returned map.
pub trait ExerciseLookup {
    fn quantification_types(
        &self,
        ids: &BTreeSet<&str>,
    ) -> Result<HashMap<String, QuantificationType>>;
}

impl ExerciseLookup for Catalog {
    fn quantification_types(
        &self,
        ids: &BTreeSet<&str>,
    ) -> Result<HashMap<String, QuantificationType>> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.exercises
                    .get(*id)
                    .map(|e| (e.id.clone(), e.quantification))
            })
            .collect())
    }
}

fn exercise(
    id: &str,
    name: &str,
    category: ExerciseCategory,
    difficulty: u8,
    quantification: QuantificationType,
    tags: &[&str],
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category,
        difficulty,
        quantification,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Builds the default catalog with the built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    use ExerciseCategory::*;
    use QuantificationType::*;

    let exercises = vec![
        // Push
        exercise("pushup", "Pompes", Push, 2, Repetition, &["chest", "triceps"]),
        exercise("diamond_pushup", "Pompes diamant", Push, 3, Repetition, &["triceps"]),
        exercise("pike_pushup", "Pompes piquées", Push, 4, Repetition, &["shoulders"]),
        exercise("dip", "Dips", Push, 4, Repetition, &["chest", "triceps"]),
        exercise("handstand_pushup", "Pompes en équilibre", Push, 8, Repetition, &["shoulders"]),
        // Pull
        exercise("australian_row", "Tractions australiennes", Pull, 2, Repetition, &["back"]),
        exercise("pullup", "Tractions", Pull, 4, Repetition, &["back", "biceps"]),
        exercise("chinup", "Tractions supination", Pull, 3, Repetition, &["back", "biceps"]),
        exercise("muscle_up", "Muscle-up", Pull, 8, Repetition, &["back", "triceps", "explosive"]),
        // Legs
        exercise("squat", "Squats", Legs, 1, Repetition, &["quads", "glutes"]),
        exercise("lunge", "Fentes", Legs, 2, Repetition, &["quads", "glutes"]),
        exercise("pistol_squat", "Pistol squat", Legs, 7, Repetition, &["quads", "balance"]),
        exercise("wall_sit", "Chaise", Legs, 1, Hold, &["quads", "isometric"]),
        // Core
        exercise("plank", "Gainage", Core, 1, Hold, &["abs", "isometric"]),
        exercise("hollow_hold", "Hollow body", Core, 3, Hold, &["abs", "isometric"]),
        exercise("hanging_leg_raise", "Relevés de jambes", Core, 5, Repetition, &["abs"]),
        exercise("l_sit", "L-sit", Core, 6, Hold, &["abs", "isometric"]),
        // Skill
        exercise("handstand", "Équilibre", Skill, 6, Hold, &["balance", "shoulders"]),
        exercise("front_lever", "Front lever", Skill, 9, Hold, &["back", "isometric"]),
        exercise("back_lever", "Back lever", Skill, 7, Hold, &["back", "isometric"]),
        exercise("planche", "Planche", Skill, 10, Hold, &["shoulders", "isometric"]),
    ];

    Catalog {
        exercises: exercises.into_iter().map(|e| (e.id.clone(), e)).collect(),
    }
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    /// Copy of this catalog with the configured custom exercises merged in
    ///
    /// A custom exercise whose id already exists replaces the built-in one.
    pub fn with_custom(&self, custom: &[CustomExercise]) -> Catalog {
        let mut catalog = self.clone();
        for c in custom {
            if catalog.exercises.contains_key(&c.id) {
                tracing::info!("Custom exercise '{}' overrides built-in definition", c.id);
            }
            catalog.exercises.insert(
                c.id.clone(),
                Exercise {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    category: c.category,
                    difficulty: c.difficulty,
                    quantification: c.quantification,
                    tags: c.tags.clone(),
                },
            );
        }
        catalog
    }

    /// Exercises of a category, easiest first
    pub fn filter_by_category(&self, category: ExerciseCategory) -> Vec<&Exercise> {
        let mut found: Vec<_> = self
            .exercises
            .values()
            .filter(|e| e.category == category)
            .collect();
        found.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then(a.id.cmp(&b.id)));
        found
    }

    /// All exercises sorted by category then difficulty
    pub fn sorted(&self) -> Vec<&Exercise> {
        let mut all: Vec<_> = self.exercises.values().collect();
        all.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.difficulty.cmp(&b.difficulty))
                .then(a.id.cmp(&b.id))
        });
        all
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
            if !(1..=10).contains(&exercise.difficulty) {
                errors.push(format!(
                    "Exercise '{}': difficulty {} outside 1..=10",
                    id, exercise.difficulty
                ));
            }
        }

        for category in ExerciseCategory::ALL {
            if !self.exercises.values().any(|e| e.category == category) {
                errors.push(format!("Catalog has no {:?} exercises", category));
            }
        }

        errors
    }
}
