use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitness_core::model::{
    BodyMetric, BodyMetricId, Email, Exercise, ExerciseId, Food, FoodId, Goal, GoalDraft, GoalId,
    GoalStatus, MealDraft, MealEntry, MealLog, MealLogId, Measurement, MuscleGroup, User, UserId,
    Username, ValidExercise, ValidFood, Workout, WorkoutExerciseDraft, WorkoutHeader, WorkoutId,
};
use thiserror::Error;

pub use crate::memory::InMemoryRepository;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Column protected by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by storage adapters.
///
/// A failed write never leaves partial state behind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("{0} already in use")]
    Conflict(UniqueField),

    #[error("still referenced by other records")]
    Referenced,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS & QUERIES ─────────────────────────────────────────────────────────
//

/// Insert shape for a new account. The hash is produced by the caller.
#[derive(Clone)]
pub struct NewUserRecord {
    pub username: Username,
    pub email: Email,
    pub full_name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for NewUserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserRecord")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewBodyMetricRecord {
    pub user_id: UserId,
    pub recorded_at: DateTime<Utc>,
    pub measurement: Measurement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutRecord {
    pub user_id: UserId,
    pub header: WorkoutHeader,
    pub exercises: Vec<WorkoutExerciseDraft>,
}

/// Inclusive timestamp window; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.until.is_none_or(|until| at <= until)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutQuery {
    pub range: DateRange,
    /// Case-insensitive substring of the workout name.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealQuery {
    pub range: DateRange,
    /// Restrict to these foods; empty means all.
    pub food_ids: Vec<FoodId>,
}

//
// ─── REPOSITORY TRAITS ─────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username or email is taken.
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Exact, case-sensitive lookup.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Update display name and email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id and
    /// `StorageError::Conflict(Email)` if another account owns the email.
    async fn update_profile(
        &self,
        id: UserId,
        full_name: Option<String>,
        email: &Email,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id.
    async fn update_password_hash(&self, id: UserId, password_hash: &str)
    -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_users(&self) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait BodyMetricRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the metric cannot be stored.
    async fn insert_metric(&self, metric: NewBodyMetricRecord)
    -> Result<BodyMetricId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_metric(
        &self,
        user_id: UserId,
        id: BodyMetricId,
    ) -> Result<Option<BodyMetric>, StorageError>;

    /// Persist changed measurements or timestamp, scoped by the metric's owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no row matches id and owner.
    async fn update_metric(&self, metric: &BodyMetric) -> Result<(), StorageError>;

    /// Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_metric(&self, user_id: UserId, id: BodyMetricId) -> Result<bool, StorageError>;

    /// Metrics in the range, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_metrics(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<BodyMetric>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn latest_metric(&self, user_id: UserId) -> Result<Option<BodyMetric>, StorageError>;
}

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the exercise cannot be stored.
    async fn insert_exercise(&self, exercise: ValidExercise) -> Result<ExerciseId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id.
    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Referenced` while a workout still uses the exercise.
    async fn delete_exercise(&self, id: ExerciseId) -> Result<bool, StorageError>;

    /// Catalog ordered by name, optionally for one muscle group.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_exercises(
        &self,
        muscle_group: Option<MuscleGroup>,
    ) -> Result<Vec<Exercise>, StorageError>;
}

#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Insert a workout and its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if a line references a missing exercise.
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<WorkoutId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_workout(
        &self,
        user_id: UserId,
        id: WorkoutId,
    ) -> Result<Option<Workout>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no workout matches id and owner.
    async fn update_workout_header(
        &self,
        user_id: UserId,
        id: WorkoutId,
        header: &WorkoutHeader,
    ) -> Result<(), StorageError>;

    /// Swap all lines of a workout atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the workout or a referenced exercise is missing.
    async fn replace_workout_exercises(
        &self,
        user_id: UserId,
        id: WorkoutId,
        exercises: Vec<WorkoutExerciseDraft>,
    ) -> Result<(), StorageError>;

    /// Delete a workout together with its lines.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_workout(&self, user_id: UserId, id: WorkoutId) -> Result<bool, StorageError>;

    /// Workouts newest first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_workouts(
        &self,
        user_id: UserId,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_workouts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError>;
}

#[async_trait]
pub trait FoodRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the food cannot be stored.
    async fn insert_food(&self, food: ValidFood) -> Result<FoodId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_food(&self, id: FoodId) -> Result<Option<Food>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id.
    async fn update_food(&self, food: &Food) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Referenced` while a meal still uses the food.
    async fn delete_food(&self, id: FoodId) -> Result<bool, StorageError>;

    /// Catalog ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_foods(&self) -> Result<Vec<Food>, StorageError>;
}

#[async_trait]
pub trait MealLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the food does not exist.
    async fn insert_meal(&self, user_id: UserId, meal: MealDraft)
    -> Result<MealLogId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_meal(
        &self,
        user_id: UserId,
        id: MealLogId,
    ) -> Result<Option<MealEntry>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no meal matches id and owner, or the
    /// new food does not exist.
    async fn update_meal(&self, meal: &MealLog) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_meal(&self, user_id: UserId, id: MealLogId) -> Result<bool, StorageError>;

    /// Meals joined with their food, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_meals(
        &self,
        user_id: UserId,
        query: &MealQuery,
    ) -> Result<Vec<MealEntry>, StorageError>;

    /// Unrounded sum of `quantity / 100 * calories` for meals at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn calories_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<f64, StorageError>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert an active goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the goal cannot be stored.
    async fn insert_goal(&self, user_id: UserId, goal: GoalDraft) -> Result<GoalId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_goal(&self, user_id: UserId, id: GoalId) -> Result<Option<Goal>, StorageError>;

    /// Persist fields and completion state, scoped by the goal's owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no goal matches id and owner.
    async fn update_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<bool, StorageError>;

    /// Active goals by target date (undated last); completed goals by
    /// completion date, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_goals(
        &self,
        user_id: UserId,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates every repository behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub body_metrics: Arc<dyn BodyMetricRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub workouts: Arc<dyn WorkoutRepository>,
    pub foods: Arc<dyn FoodRepository>,
    pub meals: Arc<dyn MealLogRepository>,
    pub goals: Arc<dyn GoalRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            body_metrics: Arc::new(repo.clone()),
            exercises: Arc::new(repo.clone()),
            workouts: Arc::new(repo.clone()),
            foods: Arc::new(repo.clone()),
            meals: Arc::new(repo.clone()),
            goals: Arc::new(repo),
        }
    }
}
