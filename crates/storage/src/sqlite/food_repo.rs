use fitness_core::model::{Food, FoodId, ValidFood};

use super::SqliteRepository;
use super::mapping::{conn, delete_err, food_id_from_i64, id_to_i64, map_food_columns, write_err};
use crate::repository::{FoodRepository, StorageError};

#[async_trait::async_trait]
impl FoodRepository for SqliteRepository {
    async fn insert_food(&self, food: ValidFood) -> Result<FoodId, StorageError> {
        let n = food.per_100g;
        let res = sqlx::query(
            r"
            INSERT INTO foods (name, calories, protein, carbs, fat)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(food.name)
        .bind(n.calories)
        .bind(n.protein)
        .bind(n.carbs)
        .bind(n.fat)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        food_id_from_i64(res.last_insert_rowid())
    }

    async fn get_food(&self, id: FoodId) -> Result<Option<Food>, StorageError> {
        let row = sqlx::query("SELECT id, name, calories, protein, carbs, fat FROM foods WHERE id = ?1")
            .bind(id_to_i64("food_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(|r| map_food_columns(r, "")).transpose()
    }

    async fn update_food(&self, food: &Food) -> Result<(), StorageError> {
        let n = food.per_100g;
        let res = sqlx::query(
            r"
            UPDATE foods
            SET name = ?1, calories = ?2, protein = ?3, carbs = ?4, fat = ?5
            WHERE id = ?6
            ",
        )
        .bind(&food.name)
        .bind(n.calories)
        .bind(n.protein)
        .bind(n.carbs)
        .bind(n.fat)
        .bind(id_to_i64("food_id", food.id.value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_food(&self, id: FoodId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM foods WHERE id = ?1")
            .bind(id_to_i64("food_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(delete_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_foods(&self) -> Result<Vec<Food>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, calories, protein, carbs, fat FROM foods ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(|r| map_food_columns(r, "")).collect()
    }
}
