use std::sync::Arc;

use chrono::{DateTime, Utc};
use fitness_core::model::{BodyMetric, BodyMetricId, Measurement};
use serde::Serialize;
use storage::repository::{BodyMetricRepository, DateRange, NewBodyMetricRecord};

use crate::Clock;
use crate::error::TrackingError;
use crate::session_guard::ActiveUser;

/// One point of the weight trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightPoint {
    pub recorded_at: DateTime<Utc>,
    pub weight_kg: f64,
}

/// Body metric logging and history.
#[derive(Clone)]
pub struct MetricService {
    clock: Clock,
    metrics: Arc<dyn BodyMetricRepository>,
}

impl MetricService {
    #[must_use]
    pub fn new(clock: Clock, metrics: Arc<dyn BodyMetricRepository>) -> Self {
        Self { clock, metrics }
    }

    /// Log weight and height; BMI is derived. `recorded_at` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for non-positive measurements.
    pub async fn record(
        &self,
        user: &ActiveUser<'_>,
        recorded_at: Option<DateTime<Utc>>,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<BodyMetric, TrackingError> {
        let measurement = Measurement::new(weight_kg, height_cm)?;
        let recorded_at = recorded_at.unwrap_or_else(|| self.clock.now());
        let id = self
            .metrics
            .insert_metric(NewBodyMetricRecord {
                user_id: user.user_id(),
                recorded_at,
                measurement,
            })
            .await?;
        Ok(BodyMetric::new(id, user.user_id(), recorded_at, measurement))
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if the metric is missing or not owned.
    pub async fn get(
        &self,
        user: &ActiveUser<'_>,
        id: BodyMetricId,
    ) -> Result<BodyMetric, TrackingError> {
        self.metrics
            .get_metric(user.user_id(), id)
            .await?
            .ok_or(TrackingError::NotFound)
    }

    /// Replace a metric's values. BMI is recomputed.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for bad measurements and
    /// `TrackingError::NotFound` if the metric is missing or not owned.
    pub async fn update(
        &self,
        user: &ActiveUser<'_>,
        id: BodyMetricId,
        recorded_at: DateTime<Utc>,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<BodyMetric, TrackingError> {
        let mut metric = self.get(user, id).await?;
        metric.update_measurements(weight_kg, height_cm)?;
        metric.set_recorded_at(recorded_at);
        self.metrics.update_metric(&metric).await?;
        Ok(metric)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if nothing was deleted.
    pub async fn delete(
        &self,
        user: &ActiveUser<'_>,
        id: BodyMetricId,
    ) -> Result<(), TrackingError> {
        if self.metrics.delete_metric(user.user_id(), id).await? {
            Ok(())
        } else {
            Err(TrackingError::NotFound)
        }
    }

    /// Metrics in `range`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn history(
        &self,
        user: &ActiveUser<'_>,
        range: DateRange,
    ) -> Result<Vec<BodyMetric>, TrackingError> {
        Ok(self.metrics.list_metrics(user.user_id(), range).await?)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn latest(&self, user: &ActiveUser<'_>) -> Result<Option<BodyMetric>, TrackingError> {
        Ok(self.metrics.latest_metric(user.user_id()).await?)
    }

    /// All weights, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn weight_trend(
        &self,
        user: &ActiveUser<'_>,
    ) -> Result<Vec<WeightPoint>, TrackingError> {
        let mut points: Vec<WeightPoint> = self
            .history(user, DateRange::all())
            .await?
            .iter()
            .map(|m| WeightPoint {
                recorded_at: m.recorded_at(),
                weight_kg: m.weight_kg(),
            })
            .collect();
        points.reverse();
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitness_core::model::{Email, UserId, Username};
    use fitness_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, NewUserRecord, UserRepository};

    use crate::error::ErrorKind;

    async fn setup() -> (MetricService, ActiveUser<'static>, ActiveUser<'static>) {
        let repo = InMemoryRepository::new();
        let mut ids: Vec<UserId> = Vec::new();
        for name in ["ana", "bea"] {
            ids.push(
                repo.insert_user(NewUserRecord {
                    username: Username::new(name).unwrap(),
                    email: Email::parse(format!("{name}@example.com")).unwrap(),
                    full_name: None,
                    password_hash: "x".into(),
                    created_at: fixed_now(),
                })
                .await
                .unwrap(),
            );
        }
        (
            MetricService::new(fixed_clock(), Arc::new(repo)),
            ActiveUser::for_tests(ids[0], "ana"),
            ActiveUser::for_tests(ids[1], "bea"),
        )
    }

    #[tokio::test]
    async fn record_derives_bmi_and_defaults_time() {
        let (service, ana, _) = setup().await;
        let metric = service.record(&ana, None, 70.0, 170.0).await.unwrap();
        assert_eq!(metric.bmi(), 24.22);
        assert_eq!(metric.recorded_at(), fixed_now());

        let err = service.record(&ana, None, 0.0, 170.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn update_recomputes_bmi() {
        let (service, ana, _) = setup().await;
        let metric = service.record(&ana, None, 70.0, 170.0).await.unwrap();
        let updated = service
            .update(&ana, metric.id(), fixed_now(), 80.0, 180.0)
            .await
            .unwrap();
        assert_eq!(updated.bmi(), 24.69);
        assert_eq!(service.get(&ana, metric.id()).await.unwrap().bmi(), 24.69);
    }

    #[tokio::test]
    async fn other_users_metrics_are_not_found() {
        let (service, ana, bea) = setup().await;
        let metric = service.record(&ana, None, 70.0, 170.0).await.unwrap();

        assert!(matches!(
            service.get(&bea, metric.id()).await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.update(&bea, metric.id(), fixed_now(), 60.0, 170.0).await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.delete(&bea, metric.id()).await,
            Err(TrackingError::NotFound)
        ));
        assert!(service.latest(&bea).await.unwrap().is_none());
        assert_eq!(service.get(&ana, metric.id()).await.unwrap().weight_kg(), 70.0);
    }

    #[tokio::test]
    async fn weight_trend_is_chronological() {
        let (service, ana, _) = setup().await;
        let now = fixed_now();
        for (days_ago, weight) in [(0, 70.0), (14, 73.0), (7, 71.5)] {
            service
                .record(&ana, Some(now - Duration::days(days_ago)), weight, 170.0)
                .await
                .unwrap();
        }
        let trend: Vec<f64> = service
            .weight_trend(&ana)
            .await
            .unwrap()
            .iter()
            .map(|p| p.weight_kg)
            .collect();
        assert_eq!(trend, vec![73.0, 71.5, 70.0]);

        let recent = service
            .history(&ana, DateRange::since(now - Duration::days(8)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
    }
}
