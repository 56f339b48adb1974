use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::account_service::AccountService;
use crate::config::AppConfig;
use crate::credentials::CredentialStore;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::exercise_service::ExerciseService;
use crate::goal_service::GoalService;
use crate::metric_service::MetricService;
use crate::nutrition_service::NutritionService;
use crate::session_guard::SessionGuard;
use crate::workout_service::WorkoutService;

/// Assembles every app-facing service over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    session_guard: Arc<SessionGuard>,
    accounts: Arc<AccountService>,
    metrics: Arc<MetricService>,
    exercises: Arc<ExerciseService>,
    workouts: Arc<WorkoutService>,
    nutrition: Arc<NutritionService>,
    goals: Arc<GoalService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage at `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the pool cannot be opened or migrations fail.
    pub async fn new_sqlite(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        info!(database_url = %config.database_url, "storage ready");
        Ok(Self::from_storage(&storage, clock, config))
    }

    /// Build services over an existing storage aggregate.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, config: &AppConfig) -> Self {
        let credentials = CredentialStore::new(config.hash_cost);
        let metric_service = MetricService::new(clock, Arc::clone(&storage.body_metrics));

        let session_guard = Arc::new(SessionGuard::new(
            Arc::clone(&storage.users),
            credentials,
            config.session,
        ));
        let accounts = Arc::new(AccountService::new(
            clock,
            Arc::clone(&storage.users),
            credentials,
        ));
        let exercises = Arc::new(ExerciseService::new(Arc::clone(&storage.exercises)));
        let workouts = Arc::new(WorkoutService::new(Arc::clone(&storage.workouts)));
        let nutrition = Arc::new(NutritionService::new(
            Arc::clone(&storage.foods),
            Arc::clone(&storage.meals),
        ));
        let goals = Arc::new(GoalService::new(
            clock,
            Arc::clone(&storage.goals),
            Arc::clone(&storage.body_metrics),
            Arc::clone(&storage.meals),
            Arc::clone(&storage.workouts),
        ));
        let dashboard = Arc::new(DashboardService::new(
            metric_service.clone(),
            Arc::clone(&storage.meals),
            Arc::clone(&storage.workouts),
        ));

        Self {
            session_guard,
            accounts,
            metrics: Arc::new(metric_service),
            exercises,
            workouts,
            nutrition,
            goals,
            dashboard,
        }
    }

    #[must_use]
    pub fn session_guard(&self) -> Arc<SessionGuard> {
        Arc::clone(&self.session_guard)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<MetricService> {
        Arc::clone(&self.metrics)
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn workouts(&self) -> Arc<WorkoutService> {
        Arc::clone(&self.workouts)
    }

    #[must_use]
    pub fn nutrition(&self) -> Arc<NutritionService> {
        Arc::clone(&self.nutrition)
    }

    #[must_use]
    pub fn goals(&self) -> Arc<GoalService> {
        Arc::clone(&self.goals)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
