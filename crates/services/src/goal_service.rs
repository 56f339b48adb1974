use std::sync::Arc;

use chrono::{DateTime, Utc};
use fitness_core::model::{Goal, GoalDraft, GoalId, GoalStatus};
use fitness_core::progress::{Aggregate, AggregateValue, GoalProgress};
use storage::repository::{
    BodyMetricRepository, GoalRepository, MealLogRepository, WorkoutRepository,
};
use tracing::{debug, info};

use crate::Clock;
use crate::error::GoalServiceError;
use crate::session_guard::ActiveUser;

/// Goal management and progress evaluation.
#[derive(Clone)]
pub struct GoalService {
    clock: Clock,
    goals: Arc<dyn GoalRepository>,
    metrics: Arc<dyn BodyMetricRepository>,
    meals: Arc<dyn MealLogRepository>,
    workouts: Arc<dyn WorkoutRepository>,
}

impl GoalService {
    #[must_use]
    pub fn new(
        clock: Clock,
        goals: Arc<dyn GoalRepository>,
        metrics: Arc<dyn BodyMetricRepository>,
        meals: Arc<dyn MealLogRepository>,
        workouts: Arc<dyn WorkoutRepository>,
    ) -> Self {
        Self {
            clock,
            goals,
            metrics,
            meals,
            workouts,
        }
    }

    /// Create an active goal.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Validation` for a blank title, a negative
    /// target or a target date before the start date.
    pub async fn create(
        &self,
        user: &ActiveUser<'_>,
        draft: GoalDraft,
    ) -> Result<Goal, GoalServiceError> {
        let draft = draft.validate()?;
        let id = self.goals.insert_goal(user.user_id(), draft).await?;
        debug!(%id, user_id = %user.user_id(), "created goal");
        self.get(user, id).await
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` if the goal is missing or not owned.
    pub async fn get(&self, user: &ActiveUser<'_>, id: GoalId) -> Result<Goal, GoalServiceError> {
        self.goals
            .get_goal(user.user_id(), id)
            .await?
            .ok_or(GoalServiceError::NotFound)
    }

    /// Replace the editable fields. Completion state is kept.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Validation` for invalid fields and
    /// `GoalServiceError::NotFound` if the goal is missing or not owned.
    pub async fn update(
        &self,
        user: &ActiveUser<'_>,
        id: GoalId,
        draft: GoalDraft,
    ) -> Result<Goal, GoalServiceError> {
        let mut goal = self.get(user, id).await?;
        goal.edit(draft)?;
        self.goals.update_goal(&goal).await?;
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` if nothing was deleted.
    pub async fn delete(&self, user: &ActiveUser<'_>, id: GoalId) -> Result<(), GoalServiceError> {
        if self.goals.delete_goal(user.user_id(), id).await? {
            Ok(())
        } else {
            Err(GoalServiceError::NotFound)
        }
    }

    /// Mark a goal completed today. A completed goal keeps its first date.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` if the goal is missing or not owned.
    pub async fn complete(
        &self,
        user: &ActiveUser<'_>,
        id: GoalId,
    ) -> Result<Goal, GoalServiceError> {
        let mut goal = self.get(user, id).await?;
        if goal.is_completed() {
            return Ok(goal);
        }
        goal.complete(self.clock.today());
        self.goals.update_goal(&goal).await?;
        info!(%id, user_id = %user.user_id(), "goal completed");
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the query fails.
    pub async fn list(
        &self,
        user: &ActiveUser<'_>,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, GoalServiceError> {
        Ok(self.goals.list_goals(user.user_id(), status).await?)
    }

    /// Progress of one goal at `now`. Reaching 100% does not complete it.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` if the goal is missing or not owned.
    pub async fn evaluate_goal(
        &self,
        user: &ActiveUser<'_>,
        id: GoalId,
        now: DateTime<Utc>,
    ) -> Result<GoalProgress, GoalServiceError> {
        let goal = self.get(user, id).await?;
        self.progress_of(user, &goal, now).await
    }

    /// Progress of every active goal, in listing order.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if a query fails.
    pub async fn evaluate_active_goals(
        &self,
        user: &ActiveUser<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GoalProgress>, GoalServiceError> {
        let goals = self.list(user, GoalStatus::Active).await?;
        let mut out = Vec::with_capacity(goals.len());
        for goal in &goals {
            out.push(self.progress_of(user, goal, now).await?);
        }
        Ok(out)
    }

    async fn progress_of(
        &self,
        user: &ActiveUser<'_>,
        goal: &Goal,
        now: DateTime<Utc>,
    ) -> Result<GoalProgress, GoalServiceError> {
        let value = self.fetch(user, goal.category().aggregate(now)).await?;
        let progress = GoalProgress::evaluate(goal, value);
        debug!(
            goal_id = %goal.id(),
            category = %goal.category(),
            percent = progress.percent,
            "evaluated goal"
        );
        Ok(progress)
    }

    async fn fetch(
        &self,
        user: &ActiveUser<'_>,
        aggregate: Aggregate,
    ) -> Result<AggregateValue, GoalServiceError> {
        let user_id = user.user_id();
        let value = match aggregate {
            Aggregate::LatestWeight => self
                .metrics
                .latest_metric(user_id)
                .await?
                .map(|m| m.weight_kg()),
            Aggregate::CaloriesSince(since) => {
                Some(self.meals.calories_since(user_id, since).await?)
            }
            Aggregate::WorkoutsSince(since) => Some(f64::from(
                self.workouts.count_workouts_since(user_id, since).await?,
            )),
        };
        Ok(AggregateValue(value))
    }
}
