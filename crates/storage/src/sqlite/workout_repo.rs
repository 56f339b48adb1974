use chrono::{DateTime, Utc};
use fitness_core::model::{
    UserId, Workout, WorkoutExercise, WorkoutExerciseDraft, WorkoutHeader, WorkoutId,
};
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};

use super::SqliteRepository;
use super::mapping::{
    conn, id_to_i64, map_workout_exercise_row, map_workout_header, ser, workout_id_from_i64,
    write_err,
};
use crate::repository::{NewWorkoutRecord, StorageError, WorkoutQuery, WorkoutRepository};

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    workout_id: i64,
    lines: Vec<WorkoutExerciseDraft>,
) -> Result<(), StorageError> {
    for (position, line) in lines.into_iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| StorageError::Serialization("position overflow".into()))?;
        sqlx::query(
            r"
            INSERT INTO workout_exercises (workout_id, exercise_id, position, sets, reps, weight_kg, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(workout_id)
        .bind(id_to_i64("exercise_id", line.exercise_id.value())?)
        .bind(position)
        .bind(i64::from(line.sets))
        .bind(i64::from(line.reps))
        .bind(line.weight_kg)
        .bind(line.notes)
        .execute(&mut **tx)
        .await
        .map_err(write_err)?;
    }
    Ok(())
}

async fn load_lines(
    db: &mut SqliteConnection,
    workout_id: i64,
) -> Result<Vec<WorkoutExercise>, StorageError> {
    let rows = sqlx::query(
        r"
        SELECT id, workout_id, exercise_id, position, sets, reps, weight_kg, notes
        FROM workout_exercises
        WHERE workout_id = ?1
        ORDER BY position ASC, id ASC
        ",
    )
    .bind(workout_id)
    .fetch_all(&mut *db)
    .await
    .map_err(conn)?;

    rows.iter().map(map_workout_exercise_row).collect()
}

async fn owns_workout(
    db: &mut SqliteConnection,
    user_id: i64,
    workout_id: i64,
) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT 1 FROM workouts WHERE id = ?1 AND user_id = ?2")
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&mut *db)
        .await
        .map_err(conn)?;
    Ok(row.is_some())
}

#[async_trait::async_trait]
impl WorkoutRepository for SqliteRepository {
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<WorkoutId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let header = workout.header;
        let res = sqlx::query(
            r"
            INSERT INTO workouts (user_id, performed_at, name, duration_min, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("user_id", workout.user_id.value())?)
        .bind(header.performed_at)
        .bind(header.name)
        .bind(header.duration_min.map(i64::from))
        .bind(header.notes)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let workout_id = res.last_insert_rowid();
        insert_lines(&mut tx, workout_id, workout.exercises).await?;
        tx.commit().await.map_err(conn)?;

        workout_id_from_i64(workout_id)
    }

    async fn get_workout(
        &self,
        user_id: UserId,
        id: WorkoutId,
    ) -> Result<Option<Workout>, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        let row = sqlx::query(
            r"
            SELECT id, user_id, performed_at, name, duration_min, notes
            FROM workouts
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id_to_i64("workout_id", id.value())?)
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_optional(&mut *db)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw_id: i64 = row.try_get("id").map_err(ser)?;
        Ok(Some(Workout {
            id: workout_id_from_i64(raw_id)?,
            user_id,
            header: map_workout_header(&row)?,
            exercises: load_lines(&mut db, raw_id).await?,
        }))
    }

    async fn update_workout_header(
        &self,
        user_id: UserId,
        id: WorkoutId,
        header: &WorkoutHeader,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE workouts
            SET performed_at = ?1, name = ?2, duration_min = ?3, notes = ?4
            WHERE id = ?5 AND user_id = ?6
            ",
        )
        .bind(header.performed_at)
        .bind(&header.name)
        .bind(header.duration_min.map(i64::from))
        .bind(&header.notes)
        .bind(id_to_i64("workout_id", id.value())?)
        .bind(id_to_i64("user_id", user_id.value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn replace_workout_exercises(
        &self,
        user_id: UserId,
        id: WorkoutId,
        exercises: Vec<WorkoutExerciseDraft>,
    ) -> Result<(), StorageError> {
        let workout_id = id_to_i64("workout_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        if !owns_workout(&mut tx, id_to_i64("user_id", user_id.value())?, workout_id).await? {
            return Err(StorageError::NotFound);
        }
        sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?1")
            .bind(workout_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_lines(&mut tx, workout_id, exercises).await?;

        tx.commit().await.map_err(conn)
    }

    async fn delete_workout(&self, user_id: UserId, id: WorkoutId) -> Result<bool, StorageError> {
        let workout_id = id_to_i64("workout_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        if !owns_workout(&mut tx, id_to_i64("user_id", user_id.value())?, workout_id).await? {
            return Ok(false);
        }
        sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?1")
            .bind(workout_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        let res = sqlx::query("DELETE FROM workouts WHERE id = ?1")
            .bind(workout_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_workouts(
        &self,
        user_id: UserId,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        let rows = sqlx::query(
            r"
            SELECT id, user_id, performed_at, name, duration_min, notes
            FROM workouts
            WHERE user_id = ?1
              AND (?2 IS NULL OR performed_at >= ?2)
              AND (?3 IS NULL OR performed_at <= ?3)
              AND (?4 IS NULL OR instr(lower(name), lower(?4)) > 0)
            ORDER BY performed_at DESC, id DESC
            LIMIT ?5
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(query.range.from)
        .bind(query.range.until)
        .bind(query.name_contains.as_deref())
        .bind(query.limit.map_or(-1, i64::from))
        .fetch_all(&mut *db)
        .await
        .map_err(conn)?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_id: i64 = row.try_get("id").map_err(ser)?;
            workouts.push(Workout {
                id: workout_id_from_i64(raw_id)?,
                user_id,
                header: map_workout_header(&row)?,
                exercises: load_lines(&mut db, raw_id).await?,
            });
        }
        Ok(workouts)
    }

    async fn count_workouts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workouts WHERE user_id = ?1 AND performed_at >= ?2",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        u32::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}
