use chrono::Duration;
use fitness_core::model::{
    Email, ExerciseDraft, ExerciseId, FoodDraft, GoalCategory, GoalDraft, GoalStatus, MealDraft,
    Measurement, MuscleGroup, Nutrients, UserId, Username, WorkoutExerciseDraft, WorkoutHeader,
};
use fitness_core::time::fixed_now;
use storage::repository::{
    BodyMetricRepository, DateRange, ExerciseRepository, FoodRepository, GoalRepository,
    MealLogRepository, MealQuery, NewBodyMetricRecord, NewUserRecord, NewWorkoutRecord,
    StorageError, UniqueField, UserRepository, WorkoutQuery, WorkoutRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:memdb_{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn user(repo: &SqliteRepository, name: &str) -> UserId {
    repo.insert_user(NewUserRecord {
        username: Username::new(name).unwrap(),
        email: Email::parse(format!("{name}@example.com")).unwrap(),
        full_name: None,
        password_hash: "$2b$04$placeholder".into(),
        created_at: fixed_now(),
    })
    .await
    .expect("insert user")
}

async fn exercise(repo: &SqliteRepository, name: &str) -> ExerciseId {
    let draft = ExerciseDraft {
        name: name.into(),
        muscle_group: MuscleGroup::Legs,
        description: None,
        instructions: None,
        video_url: Some("https://example.com/video".into()),
        image_url: None,
    };
    repo.insert_exercise(draft.validate().unwrap())
        .await
        .expect("insert exercise")
}

fn line(exercise_id: ExerciseId, sets: u32) -> WorkoutExerciseDraft {
    WorkoutExerciseDraft {
        exercise_id,
        sets,
        reps: 10,
        weight_kg: Some(80.0),
        notes: None,
    }
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let repo = connect("migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn unique_violations_name_the_field() {
    let repo = connect("unique_users").await;
    user(&repo, "ana").await;

    let duplicate_name = NewUserRecord {
        username: Username::new("ana").unwrap(),
        email: Email::parse("other@example.com").unwrap(),
        full_name: None,
        password_hash: "x".into(),
        created_at: fixed_now(),
    };
    let err = repo.insert_user(duplicate_name).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(UniqueField::Username)));

    let duplicate_email = NewUserRecord {
        username: Username::new("bea").unwrap(),
        email: Email::parse("ana@example.com").unwrap(),
        full_name: None,
        password_hash: "x".into(),
        created_at: fixed_now(),
    };
    let err = repo.insert_user(duplicate_email).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(UniqueField::Email)));
    assert_eq!(repo.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn body_metrics_roundtrip_with_bmi() {
    let repo = connect("body_metrics").await;
    let ana = user(&repo, "ana").await;
    let bea = user(&repo, "bea").await;
    let now = fixed_now();

    let id = repo
        .insert_metric(NewBodyMetricRecord {
            user_id: ana,
            recorded_at: now,
            measurement: Measurement::new(70.0, 170.0).unwrap(),
        })
        .await
        .unwrap();

    let mut metric = repo.get_metric(ana, id).await.unwrap().expect("stored");
    assert_eq!(metric.bmi(), 24.22);
    assert!(repo.get_metric(bea, id).await.unwrap().is_none());

    metric.update_measurements(68.0, 170.0).unwrap();
    repo.update_metric(&metric).await.unwrap();
    let latest = repo.latest_metric(ana).await.unwrap().unwrap();
    assert_eq!(latest.weight_kg(), 68.0);
    assert_eq!(latest.bmi(), 23.53);

    let range = DateRange::since(now + Duration::seconds(1));
    assert!(repo.list_metrics(ana, range).await.unwrap().is_empty());
}

#[tokio::test]
async fn workout_delete_cascades_to_its_lines_only() {
    let repo = connect("workout_cascade").await;
    let ana = user(&repo, "ana").await;
    let squat = exercise(&repo, "Sentadilla").await;
    let now = fixed_now();

    let header = |name: &str| WorkoutHeader {
        performed_at: now,
        name: name.into(),
        duration_min: Some(50),
        notes: None,
    };
    let first = repo
        .insert_workout(NewWorkoutRecord {
            user_id: ana,
            header: header("Pierna A"),
            exercises: vec![line(squat, 3), line(squat, 4)],
        })
        .await
        .unwrap();
    let second = repo
        .insert_workout(NewWorkoutRecord {
            user_id: ana,
            header: header("Pierna B"),
            exercises: vec![line(squat, 5)],
        })
        .await
        .unwrap();

    let stored = repo.get_workout(ana, first).await.unwrap().unwrap();
    let positions: Vec<u32> = stored.exercises.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![0, 1]);

    assert!(repo.delete_workout(ana, first).await.unwrap());
    let orphaned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?1")
            .bind(i64::try_from(first.value()).unwrap())
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert_eq!(orphaned, 0);
    let kept = repo.get_workout(ana, second).await.unwrap().unwrap();
    assert_eq!(kept.exercises.len(), 1);
    assert_eq!(kept.exercises[0].sets, 5);
}

#[tokio::test]
async fn failed_workout_insert_leaves_nothing_behind() {
    let repo = connect("workout_atomic").await;
    let ana = user(&repo, "ana").await;
    let squat = exercise(&repo, "Sentadilla").await;

    let err = repo
        .insert_workout(NewWorkoutRecord {
            user_id: ana,
            header: WorkoutHeader {
                performed_at: fixed_now(),
                name: "Roto".into(),
                duration_min: None,
                notes: None,
            },
            exercises: vec![line(squat, 3), line(ExerciseId::new(999), 3)],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let workouts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(workouts, 0);
}

#[tokio::test]
async fn workout_history_filters_by_name_and_counts_since() {
    let repo = connect("workout_history").await;
    let ana = user(&repo, "ana").await;
    let squat = exercise(&repo, "Sentadilla").await;
    let now = fixed_now();

    for (name, days_ago) in [("Pierna", 0), ("Torso", 0), ("pierna ligera", 2)] {
        repo.insert_workout(NewWorkoutRecord {
            user_id: ana,
            header: WorkoutHeader {
                performed_at: now - Duration::days(days_ago),
                name: name.into(),
                duration_min: None,
                notes: None,
            },
            exercises: vec![line(squat, 3)],
        })
        .await
        .unwrap();
    }

    let query = WorkoutQuery {
        name_contains: Some("PIERNA".into()),
        ..WorkoutQuery::default()
    };
    let found = repo.list_workouts(ana, &query).await.unwrap();
    let names: Vec<&str> = found.iter().map(|w| w.header.name.as_str()).collect();
    assert_eq!(names, vec!["Pierna", "pierna ligera"]);

    let limited = WorkoutQuery {
        limit: Some(1),
        ..WorkoutQuery::default()
    };
    assert_eq!(repo.list_workouts(ana, &limited).await.unwrap().len(), 1);

    let since = now - Duration::hours(1);
    assert_eq!(repo.count_workouts_since(ana, since).await.unwrap(), 2);
}

#[tokio::test]
async fn meals_join_food_and_sum_calories() {
    let repo = connect("meals").await;
    let ana = user(&repo, "ana").await;
    let bea = user(&repo, "bea").await;
    let rice = repo
        .insert_food(
            FoodDraft {
                name: "Arroz".into(),
                per_100g: Nutrients {
                    calories: 130.0,
                    protein: 2.7,
                    carbs: 28.0,
                    fat: 0.3,
                },
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();
    let now = fixed_now();

    for (who, qty) in [(ana, 200.0), (ana, 100.0), (bea, 1000.0)] {
        repo.insert_meal(
            who,
            MealDraft {
                food_id: rice,
                logged_at: now,
                quantity_g: qty,
            },
        )
        .await
        .unwrap();
    }

    let entries = repo.list_meals(ana, &MealQuery::default()).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].food.name, "Arroz");
    assert_eq!(entries[0].nutrients().calories + entries[1].nutrients().calories, 390.0);

    let filtered = MealQuery {
        food_ids: vec![rice],
        ..MealQuery::default()
    };
    assert_eq!(repo.list_meals(ana, &filtered).await.unwrap().len(), 2);

    let total = repo.calories_since(ana, now).await.unwrap();
    assert!((total - 390.0).abs() < 1e-9);
    let none = repo
        .calories_since(ana, now + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(none, 0.0);

    assert!(matches!(
        repo.delete_food(rice).await,
        Err(StorageError::Referenced)
    ));
}

#[tokio::test]
async fn referenced_exercise_cannot_be_deleted() {
    let repo = connect("exercise_referenced").await;
    let ana = user(&repo, "ana").await;
    let squat = exercise(&repo, "Sentadilla").await;
    let unused = exercise(&repo, "Zancada").await;
    repo.insert_workout(NewWorkoutRecord {
        user_id: ana,
        header: WorkoutHeader {
            performed_at: fixed_now(),
            name: "Pierna".into(),
            duration_min: None,
            notes: None,
        },
        exercises: vec![line(squat, 3)],
    })
    .await
    .unwrap();

    assert!(matches!(
        repo.delete_exercise(squat).await,
        Err(StorageError::Referenced)
    ));
    assert!(repo.delete_exercise(unused).await.unwrap());
    let legs = repo
        .list_exercises(Some(MuscleGroup::Legs))
        .await
        .unwrap();
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].video_url.as_deref(), Some("https://example.com/video"));
}

#[tokio::test]
async fn goals_persist_completion() {
    let repo = connect("goals").await;
    let ana = user(&repo, "ana").await;
    let start = fixed_now().date_naive();
    let id = repo
        .insert_goal(
            ana,
            GoalDraft {
                title: "Entrenar 3 veces".into(),
                description: None,
                category: GoalCategory::Exercise,
                target_value: Some(3.0),
                target_unit: Some("sesiones".into()),
                start_date: start,
                target_date: Some(start + Duration::days(7)),
            },
        )
        .await
        .unwrap();

    let mut goal = repo.get_goal(ana, id).await.unwrap().unwrap();
    assert!(!goal.is_completed());
    goal.complete(start + Duration::days(2));
    repo.update_goal(&goal).await.unwrap();

    assert!(repo.list_goals(ana, GoalStatus::Active).await.unwrap().is_empty());
    let done = repo.list_goals(ana, GoalStatus::Completed).await.unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].completed_date(), Some(start + Duration::days(2)));
    assert_eq!(done[0].category(), GoalCategory::Exercise);
}
