use fitness_core::model::{Exercise, ExerciseId, MuscleGroup, ValidExercise};

use super::SqliteRepository;
use super::mapping::{conn, delete_err, exercise_id_from_i64, id_to_i64, map_exercise_row, write_err};
use crate::repository::{ExerciseRepository, StorageError};

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn insert_exercise(&self, exercise: ValidExercise) -> Result<ExerciseId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO exercises (name, muscle_group, description, instructions, video_url, image_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(exercise.name)
        .bind(exercise.muscle_group.label())
        .bind(exercise.description)
        .bind(exercise.instructions)
        .bind(exercise.video_url)
        .bind(exercise.image_url)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        exercise_id_from_i64(res.last_insert_rowid())
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, muscle_group, description, instructions, video_url, image_url
            FROM exercises WHERE id = ?1
            ",
        )
        .bind(id_to_i64("exercise_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_exercise_row).transpose()
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE exercises
            SET name = ?1, muscle_group = ?2, description = ?3,
                instructions = ?4, video_url = ?5, image_url = ?6
            WHERE id = ?7
            ",
        )
        .bind(&exercise.name)
        .bind(exercise.muscle_group.label())
        .bind(&exercise.description)
        .bind(&exercise.instructions)
        .bind(&exercise.video_url)
        .bind(&exercise.image_url)
        .bind(id_to_i64("exercise_id", exercise.id.value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM exercises WHERE id = ?1")
            .bind(id_to_i64("exercise_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(delete_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_exercises(
        &self,
        muscle_group: Option<MuscleGroup>,
    ) -> Result<Vec<Exercise>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, muscle_group, description, instructions, video_url, image_url
            FROM exercises
            WHERE ?1 IS NULL OR muscle_group = ?1
            ORDER BY name ASC, id ASC
            ",
        )
        .bind(muscle_group.map(MuscleGroup::label))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_exercise_row).collect()
    }
}
