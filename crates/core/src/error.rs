use thiserror::Error;

use crate::model::{
    BodyMetricError, ExerciseError, FoodError, GoalError, MealLogError, UserError, WorkoutError,
};

/// Any domain validation failure.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    BodyMetric(#[from] BodyMetricError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Workout(#[from] WorkoutError),
    #[error(transparent)]
    Food(#[from] FoodError),
    #[error(transparent)]
    MealLog(#[from] MealLogError),
    #[error(transparent)]
    Goal(#[from] GoalError),
}
