use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ExerciseId, UserId, WorkoutExerciseId, WorkoutId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum WorkoutError {
    #[error("workout name cannot be empty")]
    EmptyName,

    #[error("duration must be at least one minute")]
    InvalidDuration,

    #[error("sets must be > 0 (line {line})")]
    InvalidSets { line: usize },

    #[error("reps must be > 0 (line {line})")]
    InvalidReps { line: usize },

    #[error("weight must be a non-negative number of kilograms (line {line})")]
    InvalidWeight { line: usize },
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Name, date, duration and notes of a workout, without its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutHeader {
    pub performed_at: DateTime<Utc>,
    pub name: String,
    pub duration_min: Option<u32>,
    pub notes: Option<String>,
}

impl WorkoutHeader {
    /// # Errors
    ///
    /// Returns `EmptyName` or `InvalidDuration`.
    pub fn validate(self) -> Result<Self, WorkoutError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(WorkoutError::EmptyName);
        }
        if self.duration_min == Some(0) {
            return Err(WorkoutError::InvalidDuration);
        }
        Ok(Self {
            performed_at: self.performed_at,
            name,
            duration_min: self.duration_min,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

/// One exercise performed within a workout.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExerciseDraft {
    pub exercise_id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

/// Validates the lines of a workout, in order.
///
/// # Errors
///
/// Returns the first failing line's error; `line` is 1-based.
pub fn validate_lines(
    lines: Vec<WorkoutExerciseDraft>,
) -> Result<Vec<WorkoutExerciseDraft>, WorkoutError> {
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let n = idx + 1;
            if line.sets == 0 {
                return Err(WorkoutError::InvalidSets { line: n });
            }
            if line.reps == 0 {
                return Err(WorkoutError::InvalidReps { line: n });
            }
            if let Some(w) = line.weight_kg {
                if !w.is_finite() || w < 0.0 {
                    return Err(WorkoutError::InvalidWeight { line: n });
                }
            }
            Ok(line)
        })
        .collect()
}

//
// ─── PERSISTED ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: WorkoutExerciseId,
    pub workout_id: WorkoutId,
    pub exercise_id: ExerciseId,
    pub position: u32,
    pub sets: u32,
    pub reps: u32,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

/// A logged training session and its ordered exercise lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutId,
    pub user_id: UserId,
    pub header: WorkoutHeader,
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    /// Total volume (sets × reps × kg) across lines with a weight.
    #[must_use]
    pub fn volume_kg(&self) -> f64 {
        self.exercises
            .iter()
            .filter_map(|line| {
                line.weight_kg
                    .map(|w| f64::from(line.sets) * f64::from(line.reps) * w)
            })
            .sum()
    }
}
