use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::ExerciseId;

//
// ─── MUSCLE GROUP ──────────────────────────────────────────────────────────────
//

/// Fixed muscle-group list. Stored and displayed by its catalog label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuscleGroup {
    #[serde(rename = "Pecho")]
    Chest,
    #[serde(rename = "Espalda")]
    Back,
    #[serde(rename = "Hombros")]
    Shoulders,
    #[serde(rename = "Bíceps")]
    Biceps,
    #[serde(rename = "Tríceps")]
    Triceps,
    #[serde(rename = "Piernas")]
    Legs,
    #[serde(rename = "Abdominales")]
    Abs,
    #[serde(rename = "Cardio")]
    Cardio,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 8] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Legs,
        MuscleGroup::Abs,
        MuscleGroup::Cardio,
    ];

    /// Catalog label, also used as the storage value.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Pecho",
            MuscleGroup::Back => "Espalda",
            MuscleGroup::Shoulders => "Hombros",
            MuscleGroup::Biceps => "Bíceps",
            MuscleGroup::Triceps => "Tríceps",
            MuscleGroup::Legs => "Piernas",
            MuscleGroup::Abs => "Abdominales",
            MuscleGroup::Cardio => "Cardio",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MuscleGroup {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.label() == s)
            .ok_or_else(|| ExerciseError::UnknownMuscleGroup(s.to_string()))
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise name cannot be empty")]
    EmptyName,

    #[error("unknown muscle group: {0}")]
    UnknownMuscleGroup(String),

    #[error("invalid {field} URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// User input for a catalog exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseDraft {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

impl ExerciseDraft {
    /// Trim text fields and check the media links.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyName` or `ExerciseError::InvalidUrl`.
    pub fn validate(self) -> Result<ValidExercise, ExerciseError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ExerciseError::EmptyName);
        }
        Ok(ValidExercise {
            name,
            muscle_group: self.muscle_group,
            description: non_blank(self.description),
            instructions: non_blank(self.instructions),
            video_url: media_url("video", self.video_url)?,
            image_url: media_url("image", self.image_url)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidExercise {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

impl ValidExercise {
    #[must_use]
    pub fn assign_id(self, id: ExerciseId) -> Exercise {
        Exercise {
            id,
            name: self.name,
            muscle_group: self.muscle_group,
            description: self.description,
            instructions: self.instructions,
            video_url: self.video_url,
            image_url: self.image_url,
        }
    }
}

/// Shared catalog entry referenced by workout lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn media_url(field: &'static str, value: Option<String>) -> Result<Option<String>, ExerciseError> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    Url::parse(&value).map_err(|_| ExerciseError::InvalidUrl {
        field,
        value: value.clone(),
    })?;
    Ok(Some(value))
}
