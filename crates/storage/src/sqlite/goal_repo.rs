use fitness_core::model::{Goal, GoalDraft, GoalId, GoalStatus, UserId};

use super::SqliteRepository;
use super::mapping::{conn, delete_err, goal_id_from_i64, id_to_i64, map_goal_row, write_err};
use crate::repository::{GoalRepository, StorageError};

const GOAL_COLUMNS: &str = "id, user_id, title, description, category, target_value, \
     target_unit, start_date, target_date, completed, completed_date";

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn insert_goal(&self, user_id: UserId, goal: GoalDraft) -> Result<GoalId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO goals (user_id, title, description, category, target_value,
                               target_unit, start_date, target_date, completed, completed_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL)
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(goal.title)
        .bind(goal.description)
        .bind(goal.category.as_str())
        .bind(goal.target_value)
        .bind(goal.target_unit)
        .bind(goal.start_date)
        .bind(goal.target_date)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        goal_id_from_i64(res.last_insert_rowid())
    }

    async fn get_goal(&self, user_id: UserId, id: GoalId) -> Result<Option<Goal>, StorageError> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1 AND user_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("goal_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_goal_row).transpose()
    }

    async fn update_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let fields = goal.fields();
        let res = sqlx::query(
            r"
            UPDATE goals
            SET title = ?1, description = ?2, category = ?3, target_value = ?4,
                target_unit = ?5, start_date = ?6, target_date = ?7,
                completed = ?8, completed_date = ?9
            WHERE id = ?10 AND user_id = ?11
            ",
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category.as_str())
        .bind(fields.target_value)
        .bind(&fields.target_unit)
        .bind(fields.start_date)
        .bind(fields.target_date)
        .bind(goal.is_completed())
        .bind(goal.completed_date())
        .bind(id_to_i64("goal_id", goal.id().value())?)
        .bind(id_to_i64("user_id", goal.user_id().value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM goals WHERE id = ?1 AND user_id = ?2")
            .bind(id_to_i64("goal_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(delete_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_goals(
        &self,
        user_id: UserId,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, StorageError> {
        let filter_and_order = match status {
            GoalStatus::Active => {
                "completed = 0 ORDER BY target_date IS NULL, target_date ASC, id ASC"
            }
            GoalStatus::Completed => "completed = 1 ORDER BY completed_date DESC, id DESC",
        };
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND {filter_and_order}");
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_goal_row).collect()
    }
}
