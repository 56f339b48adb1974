#![forbid(unsafe_code)]

pub mod account_service;
pub mod app_services;
pub mod config;
pub mod credentials;
pub mod dashboard_service;
pub mod error;
pub mod exercise_service;
pub mod goal_service;
pub mod metric_service;
pub mod nutrition_service;
pub mod session_guard;
pub mod workout_service;

pub use fitness_core::Clock;

pub use account_service::{AccountService, RegistrationForm};
pub use app_services::AppServices;
pub use config::{AppConfig, SessionPolicy};
pub use credentials::CredentialStore;
pub use dashboard_service::{DashboardService, DashboardSummary, WorkoutSummary};
pub use error::{
    AccountError, AppServicesError, AuthError, CredentialError, ErrorKind, GoalServiceError,
    TrackingError,
};
pub use exercise_service::ExerciseService;
pub use goal_service::GoalService;
pub use metric_service::{MetricService, WeightPoint};
pub use nutrition_service::NutritionService;
pub use session_guard::{ActiveUser, SessionGuard};
pub use workout_service::WorkoutService;
