use std::sync::Arc;

use chrono::{DateTime, Utc};
use fitness_core::model::{Workout, WorkoutId};
use fitness_core::rounding::round2;
use fitness_core::time::start_of_day;
use serde::Serialize;
use storage::repository::{MealLogRepository, WorkoutQuery, WorkoutRepository};

use crate::error::TrackingError;
use crate::metric_service::{MetricService, WeightPoint};
use crate::session_guard::ActiveUser;

const RECENT_WORKOUTS: u32 = 5;

/// Row of the recent workouts table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub id: WorkoutId,
    pub performed_at: DateTime<Utc>,
    pub name: String,
    pub duration_min: Option<u32>,
}

impl From<&Workout> for WorkoutSummary {
    fn from(workout: &Workout) -> Self {
        Self {
            id: workout.id,
            performed_at: workout.header.performed_at,
            name: workout.header.name.clone(),
            duration_min: workout.header.duration_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub latest_weight_kg: Option<f64>,
    pub calories_today: f64,
    pub recent_workouts: Vec<WorkoutSummary>,
    pub weight_trend: Vec<WeightPoint>,
}

/// Read-only overview shown after login.
#[derive(Clone)]
pub struct DashboardService {
    metrics: MetricService,
    meals: Arc<dyn MealLogRepository>,
    workouts: Arc<dyn WorkoutRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        metrics: MetricService,
        meals: Arc<dyn MealLogRepository>,
        workouts: Arc<dyn WorkoutRepository>,
    ) -> Self {
        Self {
            metrics,
            meals,
            workouts,
        }
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if any query fails.
    pub async fn summary(
        &self,
        user: &ActiveUser<'_>,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, TrackingError> {
        let latest_weight_kg = self.metrics.latest(user).await?.map(|m| m.weight_kg());
        let calories_today = round2(
            self.meals
                .calories_since(user.user_id(), start_of_day(now))
                .await?,
        );
        let recent = self
            .workouts
            .list_workouts(
                user.user_id(),
                &WorkoutQuery {
                    limit: Some(RECENT_WORKOUTS),
                    ..WorkoutQuery::default()
                },
            )
            .await?;
        let weight_trend = self.metrics.weight_trend(user).await?;

        Ok(DashboardSummary {
            latest_weight_kg,
            calories_today,
            recent_workouts: recent.iter().map(WorkoutSummary::from).collect(),
            weight_trend,
        })
    }
}
