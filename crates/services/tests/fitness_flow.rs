use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fitness_core::model::{
    Email, ExerciseDraft, FoodDraft, GoalCategory, GoalDraft, GoalStatus, MealDraft, MuscleGroup,
    Nutrients, Session, User, UserId, WorkoutExerciseDraft, WorkoutHeader,
};
use fitness_core::time::fixed_now;
use services::{
    AppConfig, AppServices, AuthError, Clock, CredentialStore, ErrorKind, RegistrationForm,
    SessionGuard, SessionPolicy, TrackingError,
};
use storage::repository::{
    DateRange, NewUserRecord, Storage, StorageError, UniqueField, UserRepository, WorkoutQuery,
};

fn config() -> AppConfig {
    AppConfig {
        hash_cost: CredentialStore::fast().cost(),
        ..AppConfig::default()
    }
}

fn in_memory_services() -> AppServices {
    AppServices::from_storage(&Storage::in_memory(), Clock::fixed(fixed_now()), &config())
}

fn form(username: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.into(),
        email: format!("{username}@example.com"),
        full_name: None,
        password: "secreto1".into(),
        confirm_password: "secreto1".into(),
    }
}

async fn sign_in(services: &AppServices, username: &str, now: DateTime<Utc>) -> Session {
    services.accounts().register(form(username)).await.unwrap();
    let mut session = Session::anonymous();
    services
        .session_guard()
        .authenticate(&mut session, username, "secreto1", now)
        .await
        .unwrap();
    session
}

fn squat() -> ExerciseDraft {
    ExerciseDraft {
        name: "Sentadilla".into(),
        muscle_group: MuscleGroup::Legs,
        description: None,
        instructions: None,
        video_url: Some("https://example.com/sentadilla.mp4".into()),
        image_url: None,
    }
}

fn rice() -> FoodDraft {
    FoodDraft {
        name: "Arroz".into(),
        per_100g: Nutrients {
            calories: 130.0,
            protein: 2.7,
            carbs: 28.2,
            fat: 0.3,
        },
    }
}

#[tokio::test]
async fn session_survives_four_idle_minutes_but_not_six() {
    let services = in_memory_services();
    services.accounts().register(form("ana")).await.unwrap();
    let guard = services.session_guard();
    let start = fixed_now();

    let mut session = Session::anonymous();
    assert!(matches!(
        guard.touch(&mut session, start),
        Err(AuthError::NotAuthenticated)
    ));

    guard
        .authenticate(&mut session, "ana", "secreto1", start)
        .await
        .unwrap();
    let active = guard
        .touch(&mut session, start + Duration::minutes(4))
        .unwrap();
    assert_eq!(active.username().as_str(), "ana");

    let err = guard
        .touch(&mut session, start + Duration::minutes(10))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionExpired);
    assert!(!session.is_authenticated());
    assert!(matches!(
        guard.touch(&mut session, start + Duration::minutes(10)),
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn data_is_reachable_only_through_a_live_session() {
    let services = in_memory_services();
    let guard = services.session_guard();
    let start = fixed_now();
    let mut session = sign_in(&services, "ana", start).await;

    let ana = guard.touch(&mut session, start).unwrap();
    services
        .metrics()
        .record(&ana, None, 70.0, 170.0)
        .await
        .unwrap();

    guard.logout(&mut session);
    assert!(matches!(
        guard.touch(&mut session, start),
        Err(AuthError::NotAuthenticated)
    ));

    guard
        .authenticate(&mut session, "ana", "secreto1", start)
        .await
        .unwrap();
    let idle = start + Duration::minutes(6);
    assert!(matches!(
        guard.touch(&mut session, idle),
        Err(AuthError::SessionExpired)
    ));

    guard
        .authenticate(&mut session, "ana", "secreto1", idle)
        .await
        .unwrap();
    let ana = guard.touch(&mut session, idle).unwrap();
    let history = services.metrics().history(&ana, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let services = in_memory_services();
    services.accounts().register(form("ana")).await.unwrap();
    let guard = services.session_guard();
    let mut session = Session::anonymous();

    let wrong = guard
        .authenticate(&mut session, "ana", "otra-clave", fixed_now())
        .await
        .unwrap_err();
    let unknown = guard
        .authenticate(&mut session, "nadie", "secreto1", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert_eq!(wrong.kind(), ErrorKind::AuthFailure);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn duplicate_registration_names_the_field() {
    let services = in_memory_services();
    services.accounts().register(form("ana")).await.unwrap();

    let mut same_email = form("bea");
    same_email.email = "ana@example.com".into();
    let err = services.accounts().register(same_email).await.unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::Conflict {
            field: Some(UniqueField::Email)
        }
    );
}

#[tokio::test]
async fn tracking_flow_feeds_goals_and_dashboard() {
    let services = in_memory_services();
    let now = fixed_now();
    let guard = services.session_guard();
    let mut session = sign_in(&services, "ana", now).await;
    let ana = guard.touch(&mut session, now).unwrap();

    services
        .metrics()
        .record(&ana, None, 70.0, 170.0)
        .await
        .unwrap();

    let exercise = services.exercises().create(&ana, squat()).await.unwrap();
    let workout = services
        .workouts()
        .log(
            &ana,
            WorkoutHeader {
                performed_at: now,
                name: "Pierna".into(),
                duration_min: Some(45),
                notes: None,
            },
            vec![WorkoutExerciseDraft {
                exercise_id: exercise.id,
                sets: 4,
                reps: 10,
                weight_kg: Some(60.0),
                notes: None,
            }],
        )
        .await
        .unwrap();
    assert_eq!(workout.volume_kg(), 2400.0);

    let food = services.nutrition().add_food(&ana, rice()).await.unwrap();
    services
        .nutrition()
        .log_meal(
            &ana,
            MealDraft {
                food_id: food.id,
                logged_at: now,
                quantity_g: 250.0,
            },
        )
        .await
        .unwrap();

    let goal = services
        .goals()
        .create(
            &ana,
            GoalDraft {
                title: "Comer 250 kcal".into(),
                description: None,
                category: GoalCategory::Nutrition,
                target_value: Some(250.0),
                target_unit: Some("kcal".into()),
                start_date: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
                target_date: None,
            },
        )
        .await
        .unwrap();
    let progress = services
        .goals()
        .evaluate_goal(&ana, goal.id(), now)
        .await
        .unwrap();
    assert_eq!(progress.percent, 100.0);
    assert_eq!(
        services
            .goals()
            .list(&ana, GoalStatus::Active)
            .await
            .unwrap()
            .len(),
        1
    );

    let summary = services.dashboard().summary(&ana, now).await.unwrap();
    assert_eq!(summary.latest_weight_kg, Some(70.0));
    assert_eq!(summary.calories_today, 325.0);
    assert_eq!(summary.recent_workouts.len(), 1);

    let err = services
        .exercises()
        .delete(&ana, exercise.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict { field: None });
}

#[tokio::test]
async fn users_cannot_reach_each_others_rows() {
    let services = in_memory_services();
    let now = fixed_now();
    let guard = services.session_guard();
    let mut ana_session = sign_in(&services, "ana", now).await;
    let mut bea_session = sign_in(&services, "bea", now).await;
    let ana = guard.touch(&mut ana_session, now).unwrap();
    let bea = guard.touch(&mut bea_session, now).unwrap();

    let metric = services
        .metrics()
        .record(&ana, None, 70.0, 170.0)
        .await
        .unwrap();
    let workout = services
        .workouts()
        .log(
            &ana,
            WorkoutHeader {
                performed_at: now,
                name: "Carrera".into(),
                duration_min: Some(30),
                notes: None,
            },
            Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        services
            .metrics()
            .get(&bea, metric.id())
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert!(matches!(
        services.workouts().delete(&bea, workout.id).await,
        Err(TrackingError::NotFound)
    ));
    assert!(
        services
            .workouts()
            .history(&bea, &WorkoutQuery::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(services.dashboard().summary(&bea, now).await.unwrap().latest_weight_kg.is_none());
}

#[tokio::test]
async fn sqlite_backed_services_delete_workouts_with_their_lines() {
    let cfg = AppConfig {
        database_url: "sqlite:file:memdb_services_flow?mode=memory&cache=shared".into(),
        ..config()
    };
    let now = fixed_now();
    let services = AppServices::new_sqlite(&cfg, Clock::fixed(now))
        .await
        .unwrap();
    let guard = services.session_guard();
    let mut session = sign_in(&services, "ana", now).await;
    let ana = guard.touch(&mut session, now).unwrap();

    let exercise = services.exercises().create(&ana, squat()).await.unwrap();
    let line = WorkoutExerciseDraft {
        exercise_id: exercise.id,
        sets: 3,
        reps: 12,
        weight_kg: None,
        notes: None,
    };
    let workout = services
        .workouts()
        .log(
            &ana,
            WorkoutHeader {
                performed_at: now,
                name: "Pierna".into(),
                duration_min: None,
                notes: None,
            },
            vec![line.clone(), line],
        )
        .await
        .unwrap();
    assert_eq!(workout.exercises.len(), 2);

    services.workouts().delete(&ana, workout.id).await.unwrap();
    services.exercises().delete(&ana, exercise.id).await.unwrap();

    let err = services.accounts().register(form("ana")).await.unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::Conflict {
            field: Some(UniqueField::Username)
        }
    );
}

struct UnavailableUsers;

#[async_trait]
impl UserRepository for UnavailableUsers {
    async fn insert_user(&self, _user: NewUserRecord) -> Result<UserId, StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn get_user(&self, _id: UserId) -> Result<Option<User>, StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn update_profile(
        &self,
        _id: UserId,
        _full_name: Option<String>,
        _email: &Email,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn update_password_hash(
        &self,
        _id: UserId,
        _password_hash: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }

    async fn count_users(&self) -> Result<u64, StorageError> {
        Err(StorageError::Connection("database is down".into()))
    }
}

#[tokio::test]
async fn backend_failures_surface_as_storage_errors() {
    let guard = SessionGuard::new(
        Arc::new(UnavailableUsers),
        CredentialStore::fast(),
        SessionPolicy::default(),
    );
    let mut session = Session::anonymous();
    let err = guard
        .authenticate(&mut session, "ana", "secreto1", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!session.is_authenticated());
}
