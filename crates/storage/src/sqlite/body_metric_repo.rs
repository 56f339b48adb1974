use fitness_core::model::{BodyMetric, BodyMetricId, UserId};

use super::SqliteRepository;
use super::mapping::{
    body_metric_id_from_i64, conn, delete_err, id_to_i64, map_body_metric_row, write_err,
};
use crate::repository::{BodyMetricRepository, DateRange, NewBodyMetricRecord, StorageError};

#[async_trait::async_trait]
impl BodyMetricRepository for SqliteRepository {
    async fn insert_metric(
        &self,
        metric: NewBodyMetricRecord,
    ) -> Result<BodyMetricId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO body_metrics (user_id, recorded_at, weight_kg, height_cm, bmi)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("user_id", metric.user_id.value())?)
        .bind(metric.recorded_at)
        .bind(metric.measurement.weight_kg())
        .bind(metric.measurement.height_cm())
        .bind(metric.measurement.bmi())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        body_metric_id_from_i64(res.last_insert_rowid())
    }

    async fn get_metric(
        &self,
        user_id: UserId,
        id: BodyMetricId,
    ) -> Result<Option<BodyMetric>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, recorded_at, weight_kg, height_cm
            FROM body_metrics
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id_to_i64("body_metric_id", id.value())?)
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_body_metric_row).transpose()
    }

    async fn update_metric(&self, metric: &BodyMetric) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE body_metrics
            SET recorded_at = ?1, weight_kg = ?2, height_cm = ?3, bmi = ?4
            WHERE id = ?5 AND user_id = ?6
            ",
        )
        .bind(metric.recorded_at())
        .bind(metric.weight_kg())
        .bind(metric.height_cm())
        .bind(metric.bmi())
        .bind(id_to_i64("body_metric_id", metric.id().value())?)
        .bind(id_to_i64("user_id", metric.user_id().value())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_metric(&self, user_id: UserId, id: BodyMetricId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM body_metrics WHERE id = ?1 AND user_id = ?2")
            .bind(id_to_i64("body_metric_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(delete_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_metrics(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<BodyMetric>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, recorded_at, weight_kg, height_cm
            FROM body_metrics
            WHERE user_id = ?1
              AND (?2 IS NULL OR recorded_at >= ?2)
              AND (?3 IS NULL OR recorded_at <= ?3)
            ORDER BY recorded_at DESC, id DESC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(range.from)
        .bind(range.until)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_body_metric_row).collect()
    }

    async fn latest_metric(&self, user_id: UserId) -> Result<Option<BodyMetric>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, recorded_at, weight_kg, height_cm
            FROM body_metrics
            WHERE user_id = ?1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_body_metric_row).transpose()
    }
}
