use chrono::{DateTime, NaiveDate, Utc};
use fitness_core::model::{
    BodyMetric, Exercise, ExerciseId, Food, FoodId, Goal, GoalCategory, GoalDraft, GoalId,
    MealEntry, MealLog, MealLogId, MuscleGroup, Nutrients, User, UserId, WorkoutExercise,
    WorkoutExerciseId, WorkoutHeader, WorkoutId,
};
use fitness_core::model::BodyMetricId;
use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;

use crate::repository::{StorageError, UniqueField};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Maps insert/update failures. A dangling foreign key means the referenced
/// row does not exist.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            ErrorKind::UniqueViolation => {
                let field = if db.message().contains("users.email") {
                    UniqueField::Email
                } else {
                    UniqueField::Username
                };
                return StorageError::Conflict(field);
            }
            ErrorKind::ForeignKeyViolation => return StorageError::NotFound,
            _ => {}
        }
    }
    conn(e)
}

/// Maps delete failures. A foreign key violation means another row still
/// points at the one being deleted.
pub(crate) fn delete_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.kind() == ErrorKind::ForeignKeyViolation {
            return StorageError::Referenced;
        }
    }
    conn(e)
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

macro_rules! id_from_i64 {
    ($fn_name:ident, $ty:ty, $field:literal) => {
        pub(crate) fn $fn_name(v: i64) -> Result<$ty, StorageError> {
            Ok(<$ty>::new(i64_to_u64($field, v)?))
        }
    };
}

id_from_i64!(user_id_from_i64, UserId, "user_id");
id_from_i64!(body_metric_id_from_i64, BodyMetricId, "body_metric_id");
id_from_i64!(exercise_id_from_i64, ExerciseId, "exercise_id");
id_from_i64!(workout_id_from_i64, WorkoutId, "workout_id");
id_from_i64!(workout_exercise_id_from_i64, WorkoutExerciseId, "workout_exercise_id");
id_from_i64!(food_id_from_i64, FoodId, "food_id");
id_from_i64!(meal_log_id_from_i64, MealLogId, "meal_log_id");
id_from_i64!(goal_id_from_i64, GoalId, "goal_id");

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    User::from_persisted(
        user_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("username").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
        row.try_get("full_name").map_err(ser)?,
        row.try_get("password_hash").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_body_metric_row(row: &SqliteRow) -> Result<BodyMetric, StorageError> {
    BodyMetric::from_persisted(
        body_metric_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        row.try_get("recorded_at").map_err(ser)?,
        row.try_get("weight_kg").map_err(ser)?,
        row.try_get("height_cm").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    let group: String = row.try_get("muscle_group").map_err(ser)?;
    Ok(Exercise {
        id: exercise_id_from_i64(row.try_get("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        muscle_group: group.parse::<MuscleGroup>().map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        instructions: row.try_get("instructions").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
        image_url: row.try_get("image_url").map_err(ser)?,
    })
}

pub(crate) fn map_workout_header(row: &SqliteRow) -> Result<WorkoutHeader, StorageError> {
    let duration: Option<i64> = row.try_get("duration_min").map_err(ser)?;
    Ok(WorkoutHeader {
        performed_at: row.try_get("performed_at").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        duration_min: duration.map(|d| i64_to_u32("duration_min", d)).transpose()?,
        notes: row.try_get("notes").map_err(ser)?,
    })
}

pub(crate) fn map_workout_exercise_row(row: &SqliteRow) -> Result<WorkoutExercise, StorageError> {
    Ok(WorkoutExercise {
        id: workout_exercise_id_from_i64(row.try_get("id").map_err(ser)?)?,
        workout_id: workout_id_from_i64(row.try_get("workout_id").map_err(ser)?)?,
        exercise_id: exercise_id_from_i64(row.try_get("exercise_id").map_err(ser)?)?,
        position: i64_to_u32("position", row.try_get("position").map_err(ser)?)?,
        sets: i64_to_u32("sets", row.try_get("sets").map_err(ser)?)?,
        reps: i64_to_u32("reps", row.try_get("reps").map_err(ser)?)?,
        weight_kg: row.try_get("weight_kg").map_err(ser)?,
        notes: row.try_get("notes").map_err(ser)?,
    })
}

/// Reads a food from columns named with the given prefix (`""` or `"food_"`).
pub(crate) fn map_food_columns(row: &SqliteRow, prefix: &str) -> Result<Food, StorageError> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(Food {
        id: food_id_from_i64(row.try_get(col("id").as_str()).map_err(ser)?)?,
        name: row.try_get(col("name").as_str()).map_err(ser)?,
        per_100g: Nutrients {
            calories: row.try_get(col("calories").as_str()).map_err(ser)?,
            protein: row.try_get(col("protein").as_str()).map_err(ser)?,
            carbs: row.try_get(col("carbs").as_str()).map_err(ser)?,
            fat: row.try_get(col("fat").as_str()).map_err(ser)?,
        },
    })
}

pub(crate) fn map_meal_entry_row(row: &SqliteRow) -> Result<MealEntry, StorageError> {
    let logged_at: DateTime<Utc> = row.try_get("logged_at").map_err(ser)?;
    let meal = MealLog::new(
        meal_log_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        food_id_from_i64(row.try_get("food_id").map_err(ser)?)?,
        logged_at,
        row.try_get("quantity_g").map_err(ser)?,
    )
    .map_err(ser)?;
    Ok(MealEntry {
        meal,
        food: map_food_columns(row, "food_")?,
    })
}

pub(crate) fn map_goal_row(row: &SqliteRow) -> Result<Goal, StorageError> {
    let category: String = row.try_get("category").map_err(ser)?;
    let completed: bool = row.try_get("completed").map_err(ser)?;
    let completed_date: Option<NaiveDate> = row.try_get("completed_date").map_err(ser)?;
    let draft = GoalDraft {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        category: category.parse::<GoalCategory>().map_err(ser)?,
        target_value: row.try_get("target_value").map_err(ser)?,
        target_unit: row.try_get("target_unit").map_err(ser)?,
        start_date: row.try_get("start_date").map_err(ser)?,
        target_date: row.try_get("target_date").map_err(ser)?,
    };
    Goal::from_persisted(
        goal_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        draft,
        completed,
        completed_date,
    )
    .map_err(ser)
}
