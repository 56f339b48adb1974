mod body_metric;
mod exercise;
mod food;
mod goal;
mod ids;
mod meal_log;
mod session;
mod user;
mod workout;

pub use ids::{
    BodyMetricId, ExerciseId, FoodId, GoalId, MealLogId, ParseIdError, UserId, WorkoutExerciseId,
    WorkoutId,
};

pub use body_metric::{bmi, BodyMetric, BodyMetricError, Measurement};
pub use exercise::{Exercise, ExerciseDraft, ExerciseError, MuscleGroup, ValidExercise};
pub use food::{Food, FoodDraft, FoodError, Nutrients, ValidFood};
pub use goal::{Goal, GoalCategory, GoalDraft, GoalError, GoalStatus};
pub use meal_log::{MealDraft, MealEntry, MealLog, MealLogError};
pub use session::{Identity, Session};
pub use user::{
    normalize_full_name, validate_new_password, Email, User, UserError, Username,
    MAX_PASSWORD_BYTES, MIN_PASSWORD_LEN,
};
pub use workout::{
    validate_lines, Workout, WorkoutError, WorkoutExercise, WorkoutExerciseDraft, WorkoutHeader,
};
