use chrono::{DateTime, Utc};
use fitness_core::model::{MealDraft, MealEntry, MealLog, MealLogId, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, delete_err, id_to_i64, map_meal_entry_row, meal_log_id_from_i64, write_err,
};
use crate::repository::{MealLogRepository, MealQuery, StorageError};

const ENTRY_SELECT: &str = r"
    SELECT m.id, m.user_id, m.food_id, m.logged_at, m.quantity_g,
           f.name AS food_name, f.calories AS food_calories, f.protein AS food_protein,
           f.carbs AS food_carbs, f.fat AS food_fat
    FROM meal_logs m
    JOIN foods f ON f.id = m.food_id
";

#[async_trait::async_trait]
impl MealLogRepository for SqliteRepository {
    async fn insert_meal(
        &self,
        user_id: UserId,
        meal: MealDraft,
    ) -> Result<MealLogId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO meal_logs (user_id, food_id, logged_at, quantity_g)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("food_id", meal.food_id.value())?)
        .bind(meal.logged_at)
        .bind(meal.quantity_g)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        meal_log_id_from_i64(res.last_insert_rowid())
    }

    async fn get_meal(
        &self,
        user_id: UserId,
        id: MealLogId,
    ) -> Result<Option<MealEntry>, StorageError> {
        let sql = format!("{ENTRY_SELECT} WHERE m.id = ?1 AND m.user_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("meal_log_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_meal_entry_row).transpose()
    }

    async fn update_meal(&self, meal: &MealLog) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE meal_logs
            SET food_id = ?1, logged_at = ?2, quantity_g = ?3
            WHERE id = ?4 AND user_id = ?5
            ",
        )
        .bind(id_to_i64("food_id", meal.food_id().value())?)
        .bind(meal.logged_at())
        .bind(meal.quantity_g())
        .bind(id_to_i64("meal_log_id", meal.id().value())?)
        .bind(id_to_i64("user_id", meal.user_id().value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_meal(&self, user_id: UserId, id: MealLogId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM meal_logs WHERE id = ?1 AND user_id = ?2")
            .bind(id_to_i64("meal_log_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(delete_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_meals(
        &self,
        user_id: UserId,
        query: &MealQuery,
    ) -> Result<Vec<MealEntry>, StorageError> {
        let mut sql = format!(
            "{ENTRY_SELECT} WHERE m.user_id = ?1
              AND (?2 IS NULL OR m.logged_at >= ?2)
              AND (?3 IS NULL OR m.logged_at <= ?3)"
        );
        if !query.food_ids.is_empty() {
            let placeholders: Vec<String> = (0..query.food_ids.len())
                .map(|i| format!("?{}", i + 4))
                .collect();
            sql.push_str(&format!(" AND m.food_id IN ({})", placeholders.join(", ")));
        }
        sql.push_str(" ORDER BY m.logged_at DESC, m.id DESC");

        let mut q = sqlx::query(&sql)
            .bind(id_to_i64("user_id", user_id.value())?)
            .bind(query.range.from)
            .bind(query.range.until);
        for food_id in &query.food_ids {
            q = q.bind(id_to_i64("food_id", food_id.value())?);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        rows.iter().map(map_meal_entry_row).collect()
    }

    async fn calories_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<f64, StorageError> {
        let total: Option<f64> = sqlx::query_scalar(
            r"
            SELECT SUM(m.quantity_g / 100.0 * f.calories)
            FROM meal_logs m
            JOIN foods f ON f.id = m.food_id
            WHERE m.user_id = ?1 AND m.logged_at >= ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        Ok(total.unwrap_or(0.0))
    }
}
