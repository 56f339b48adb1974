use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{GoalId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal title cannot be empty")]
    EmptyTitle,

    #[error("unknown goal category: {0}")]
    UnknownCategory(String),

    #[error("target value must be a non-negative number, got {0}")]
    InvalidTarget(f64),

    #[error("target date {target} is before start date {start}")]
    TargetBeforeStart { start: NaiveDate, target: NaiveDate },

    #[error("completed goals must carry a completion date")]
    MissingCompletionDate,
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// What a goal measures. Each category is tied to one aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Weight,
    Nutrition,
    Exercise,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 3] = [
        GoalCategory::Weight,
        GoalCategory::Nutrition,
        GoalCategory::Exercise,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GoalCategory::Weight => "weight",
            GoalCategory::Nutrition => "nutrition",
            GoalCategory::Exercise => "exercise",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" => Ok(Self::Weight),
            "nutrition" => Ok(Self::Nutrition),
            "exercise" => Ok(Self::Exercise),
            other => Err(GoalError::UnknownCategory(other.to_string())),
        }
    }
}

/// Filter for goal listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    Completed,
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// Editable fields of a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub target_value: Option<f64>,
    pub target_unit: Option<String>,
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
}

impl GoalDraft {
    /// # Errors
    ///
    /// Returns `GoalError` for a blank title, a negative target or a target
    /// date before the start date.
    pub fn validate(self) -> Result<Self, GoalError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(GoalError::EmptyTitle);
        }
        if let Some(value) = self.target_value {
            if !value.is_finite() || value < 0.0 {
                return Err(GoalError::InvalidTarget(value));
            }
        }
        if let Some(target) = self.target_date {
            if target < self.start_date {
                return Err(GoalError::TargetBeforeStart {
                    start: self.start_date,
                    target,
                });
            }
        }
        Ok(Self {
            title,
            description: trimmed(self.description),
            target_unit: trimmed(self.target_unit),
            ..self
        })
    }
}

/// A user's goal.
///
/// Starts active; only [`Goal::complete`] moves it to completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    id: GoalId,
    user_id: UserId,
    fields: GoalDraft,
    completed_on: Option<NaiveDate>,
}

impl Goal {
    /// New active goal from validated fields.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the draft fails validation.
    pub fn new(id: GoalId, user_id: UserId, draft: GoalDraft) -> Result<Self, GoalError> {
        Ok(Self {
            id,
            user_id,
            fields: draft.validate()?,
            completed_on: None,
        })
    }

    /// Rehydrate from storage.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the stored fields fail validation or a completed
    /// goal has no completion date.
    pub fn from_persisted(
        id: GoalId,
        user_id: UserId,
        draft: GoalDraft,
        completed: bool,
        completed_date: Option<NaiveDate>,
    ) -> Result<Self, GoalError> {
        let mut goal = Self::new(id, user_id, draft)?;
        if completed {
            goal.completed_on = Some(completed_date.ok_or(GoalError::MissingCompletionDate)?);
        }
        Ok(goal)
    }

    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.fields.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> GoalCategory {
        self.fields.category
    }

    #[must_use]
    pub fn target_value(&self) -> Option<f64> {
        self.fields.target_value
    }

    #[must_use]
    pub fn target_unit(&self) -> Option<&str> {
        self.fields.target_unit.as_deref()
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.fields.start_date
    }

    #[must_use]
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.fields.target_date
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_on.is_some()
    }

    #[must_use]
    pub fn completed_date(&self) -> Option<NaiveDate> {
        self.completed_on
    }

    #[must_use]
    pub fn fields(&self) -> &GoalDraft {
        &self.fields
    }

    /// Replace the editable fields, keeping id, owner and completion state.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` and leaves the goal untouched on invalid input.
    pub fn edit(&mut self, draft: GoalDraft) -> Result<(), GoalError> {
        self.fields = draft.validate()?;
        Ok(())
    }

    /// Mark completed on `today`. Completing twice keeps the first date.
    pub fn complete(&mut self, today: NaiveDate) {
        if self.completed_on.is_none() {
            self.completed_on = Some(today);
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
