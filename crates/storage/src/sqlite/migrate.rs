use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS body_metrics (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            recorded_at TEXT NOT NULL,
            weight_kg REAL NOT NULL CHECK (weight_kg > 0),
            height_cm REAL NOT NULL CHECK (height_cm > 0),
            bmi REAL NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            muscle_group TEXT NOT NULL CHECK (muscle_group IN (
                'Pecho', 'Espalda', 'Hombros', 'Bíceps',
                'Tríceps', 'Piernas', 'Abdominales', 'Cardio'
            )),
            description TEXT,
            instructions TEXT,
            video_url TEXT,
            image_url TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS workouts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            performed_at TEXT NOT NULL,
            name TEXT NOT NULL,
            duration_min INTEGER CHECK (duration_min >= 1),
            notes TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS workout_exercises (
            id INTEGER PRIMARY KEY,
            workout_id INTEGER NOT NULL,
            exercise_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            sets INTEGER NOT NULL CHECK (sets >= 1),
            reps INTEGER NOT NULL CHECK (reps >= 1),
            weight_kg REAL CHECK (weight_kg >= 0),
            notes TEXT,
            FOREIGN KEY (workout_id) REFERENCES workouts(id) ON DELETE CASCADE,
            FOREIGN KEY (exercise_id) REFERENCES exercises(id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS foods (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            calories REAL NOT NULL CHECK (calories >= 0),
            protein REAL NOT NULL CHECK (protein >= 0),
            carbs REAL NOT NULL CHECK (carbs >= 0),
            fat REAL NOT NULL CHECK (fat >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS meal_logs (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            food_id INTEGER NOT NULL,
            logged_at TEXT NOT NULL,
            quantity_g REAL NOT NULL CHECK (quantity_g > 0),
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (food_id) REFERENCES foods(id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL CHECK (category IN ('weight', 'nutrition', 'exercise')),
            target_value REAL CHECK (target_value >= 0),
            target_unit TEXT,
            start_date TEXT NOT NULL,
            target_date TEXT,
            completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
            completed_date TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_body_metrics_user_recorded
            ON body_metrics (user_id, recorded_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_workouts_user_performed
            ON workouts (user_id, performed_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_workout_exercises_workout
            ON workout_exercises (workout_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_meal_logs_user_logged
            ON meal_logs (user_id, logged_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_goals_user_completed
            ON goals (user_id, completed);
    ",
];

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates users, body metrics, the exercise and food catalogs,
/// workouts with their lines, meal logs and goals.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
