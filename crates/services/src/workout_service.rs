use std::sync::Arc;

use fitness_core::model::{
    Workout, WorkoutExerciseDraft, WorkoutHeader, WorkoutId, validate_lines,
};
use storage::repository::{NewWorkoutRecord, WorkoutQuery, WorkoutRepository};
use tracing::debug;

use crate::error::TrackingError;
use crate::session_guard::ActiveUser;

/// Workout logging with ordered exercise lines.
#[derive(Clone)]
pub struct WorkoutService {
    workouts: Arc<dyn WorkoutRepository>,
}

impl WorkoutService {
    #[must_use]
    pub fn new(workouts: Arc<dyn WorkoutRepository>) -> Self {
        Self { workouts }
    }

    /// Store a workout and its lines atomically.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for a blank name, zero duration or
    /// a line with zero sets/reps or negative weight, and
    /// `TrackingError::NotFound` if a line names an unknown exercise.
    pub async fn log(
        &self,
        user: &ActiveUser<'_>,
        header: WorkoutHeader,
        lines: Vec<WorkoutExerciseDraft>,
    ) -> Result<Workout, TrackingError> {
        let header = header.validate()?;
        let exercises = validate_lines(lines)?;
        let id = self
            .workouts
            .insert_workout(NewWorkoutRecord {
                user_id: user.user_id(),
                header,
                exercises,
            })
            .await?;
        debug!(%id, user_id = %user.user_id(), "logged workout");
        self.get(user, id).await
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if the workout is missing or not owned.
    pub async fn get(
        &self,
        user: &ActiveUser<'_>,
        id: WorkoutId,
    ) -> Result<Workout, TrackingError> {
        self.workouts
            .get_workout(user.user_id(), id)
            .await?
            .ok_or(TrackingError::NotFound)
    }

    /// Edit name, date, duration and notes. Lines are kept.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for invalid header fields and
    /// `TrackingError::NotFound` if the workout is missing or not owned.
    pub async fn update_header(
        &self,
        user: &ActiveUser<'_>,
        id: WorkoutId,
        header: WorkoutHeader,
    ) -> Result<Workout, TrackingError> {
        let header = header.validate()?;
        self.workouts
            .update_workout_header(user.user_id(), id, &header)
            .await?;
        self.get(user, id).await
    }

    /// Replace every line of a workout in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for an invalid line and
    /// `TrackingError::NotFound` if the workout or an exercise is missing.
    pub async fn replace_exercises(
        &self,
        user: &ActiveUser<'_>,
        id: WorkoutId,
        lines: Vec<WorkoutExerciseDraft>,
    ) -> Result<Workout, TrackingError> {
        let lines = validate_lines(lines)?;
        self.workouts
            .replace_workout_exercises(user.user_id(), id, lines)
            .await?;
        self.get(user, id).await
    }

    /// Delete a workout together with its lines.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if nothing was deleted.
    pub async fn delete(&self, user: &ActiveUser<'_>, id: WorkoutId) -> Result<(), TrackingError> {
        if !self.workouts.delete_workout(user.user_id(), id).await? {
            return Err(TrackingError::NotFound);
        }
        debug!(%id, user_id = %user.user_id(), "deleted workout");
        Ok(())
    }

    /// Workouts newest first, filtered by date range and name.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn history(
        &self,
        user: &ActiveUser<'_>,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, TrackingError> {
        Ok(self.workouts.list_workouts(user.user_id(), query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitness_core::model::{
        Email, ExerciseDraft, ExerciseId, MuscleGroup, UserId, Username, WorkoutError,
    };
    use fitness_core::time::fixed_now;
    use storage::repository::{
        ExerciseRepository, InMemoryRepository, NewUserRecord, UserRepository,
    };

    async fn setup() -> (WorkoutService, ActiveUser<'static>, ActiveUser<'static>, ExerciseId) {
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
        let squat = repo
            .insert_exercise(
                ExerciseDraft {
                    name: "Sentadilla".into(),
                    muscle_group: MuscleGroup::Legs,
                    description: None,
                    instructions: None,
                    video_url: None,
                    image_url: None,
                }
                .validate()
                .unwrap(),
            )
            .await
            .unwrap();
        (
            WorkoutService::new(Arc::new(repo)),
            ActiveUser::for_tests(ids[0], "ana"),
            ActiveUser::for_tests(ids[1], "bea"),
            squat,
        )
    }

    fn header(name: &str) -> WorkoutHeader {
        WorkoutHeader {
            performed_at: fixed_now(),
            name: name.into(),
            duration_min: Some(60),
            notes: None,
        }
    }

    fn line(exercise_id: ExerciseId, sets: u32, reps: u32) -> WorkoutExerciseDraft {
        WorkoutExerciseDraft {
            exercise_id,
            sets,
            reps,
            weight_kg: Some(0.0),
            notes: None,
        }
    }

    #[tokio::test]
    async fn log_returns_ordered_lines() {
        let (service, ana, _, squat) = setup().await;
        let workout = service
            .log(&ana, header(" Pierna "), vec![line(squat, 3, 12), line(squat, 4, 8)])
            .await
            .unwrap();
        assert_eq!(workout.header.name, "Pierna");
        let reps: Vec<u32> = workout.exercises.iter().map(|l| l.reps).collect();
        assert_eq!(reps, vec![12, 8]);
    }

    #[tokio::test]
    async fn invalid_line_writes_nothing() {
        let (service, ana, _, squat) = setup().await;
        let err = service
            .log(&ana, header("Pierna"), vec![line(squat, 3, 12), line(squat, 0, 8)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrackingError::Validation(fitness_core::Error::Workout(
                WorkoutError::InvalidSets { line: 2 }
            ))
        ));
        assert!(
            service
                .history(&ana, &WorkoutQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn header_edit_keeps_lines_and_replace_swaps_them() {
        let (service, ana, _, squat) = setup().await;
        let workout = service
            .log(&ana, header("Pierna"), vec![line(squat, 3, 12)])
            .await
            .unwrap();

        let mut edited = header("Pierna pesada");
        edited.performed_at = fixed_now() - Duration::days(1);
        let updated = service
            .update_header(&ana, workout.id, edited)
            .await
            .unwrap();
        assert_eq!(updated.header.name, "Pierna pesada");
        assert_eq!(updated.exercises.len(), 1);

        let replaced = service
            .replace_exercises(&ana, workout.id, vec![line(squat, 5, 5), line(squat, 5, 5)])
            .await
            .unwrap();
        assert_eq!(replaced.exercises.len(), 2);
        assert!(replaced.exercises.iter().all(|l| l.sets == 5));
    }

    #[tokio::test]
    async fn foreign_workouts_behave_as_missing() {
        let (service, ana, bea, squat) = setup().await;
        let workout = service
            .log(&ana, header("Pierna"), vec![line(squat, 3, 12)])
            .await
            .unwrap();

        assert!(matches!(
            service.get(&bea, workout.id).await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.update_header(&bea, workout.id, header("Robo")).await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.delete(&bea, workout.id).await,
            Err(TrackingError::NotFound)
        ));
        service.delete(&ana, workout.id).await.unwrap();
        assert!(matches!(
            service.get(&ana, workout.id).await,
            Err(TrackingError::NotFound)
        ));
    }
}
