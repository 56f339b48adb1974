use std::sync::Arc;

use fitness_core::model::{Exercise, ExerciseDraft, ExerciseId, MuscleGroup};
use storage::repository::ExerciseRepository;
use tracing::debug;

use crate::error::TrackingError;
use crate::session_guard::ActiveUser;

/// Shared exercise catalog. Entries are not owned by any user, but every
/// call still goes through the session gate.
#[derive(Clone)]
pub struct ExerciseService {
    exercises: Arc<dyn ExerciseRepository>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(exercises: Arc<dyn ExerciseRepository>) -> Self {
        Self { exercises }
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for a blank name or a malformed URL.
    pub async fn create(
        &self,
        user: &ActiveUser<'_>,
        draft: ExerciseDraft,
    ) -> Result<Exercise, TrackingError> {
        let valid = draft.validate()?;
        let id = self.exercises.insert_exercise(valid.clone()).await?;
        debug!(%id, user_id = %user.user_id(), "added exercise to catalog");
        Ok(valid.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` for an unknown id.
    pub async fn get(
        &self,
        _user: &ActiveUser<'_>,
        id: ExerciseId,
    ) -> Result<Exercise, TrackingError> {
        self.exercises
            .get_exercise(id)
            .await?
            .ok_or(TrackingError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for invalid fields and
    /// `TrackingError::NotFound` for an unknown id.
    pub async fn update(
        &self,
        _user: &ActiveUser<'_>,
        id: ExerciseId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, TrackingError> {
        let exercise = draft.validate()?.assign_id(id);
        self.exercises.update_exercise(&exercise).await?;
        Ok(exercise)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::InUse` while a workout references the exercise
    /// and `TrackingError::NotFound` for an unknown id.
    pub async fn delete(&self, user: &ActiveUser<'_>, id: ExerciseId) -> Result<(), TrackingError> {
        if !self.exercises.delete_exercise(id).await? {
            return Err(TrackingError::NotFound);
        }
        debug!(%id, user_id = %user.user_id(), "removed exercise from catalog");
        Ok(())
    }

    /// Catalog ordered by name, optionally for one muscle group.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn list(
        &self,
        _user: &ActiveUser<'_>,
        muscle_group: Option<MuscleGroup>,
    ) -> Result<Vec<Exercise>, TrackingError> {
        Ok(self.exercises.list_exercises(muscle_group).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_core::model::{ExerciseError, UserId};
    use storage::repository::InMemoryRepository;

    fn draft(name: &str, muscle_group: MuscleGroup) -> ExerciseDraft {
        ExerciseDraft {
            name: name.into(),
            muscle_group,
            description: None,
            instructions: Some("Mantener la espalda recta".into()),
            video_url: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn catalog_filters_by_muscle_group() {
        let service = ExerciseService::new(Arc::new(InMemoryRepository::new()));
        let user = ActiveUser::for_tests(UserId::new(1), "ana");
        service
            .create(&user, draft("Sentadilla", MuscleGroup::Legs))
            .await
            .unwrap();
        service
            .create(&user, draft("Press de banca", MuscleGroup::Chest))
            .await
            .unwrap();
        service
            .create(&user, draft("Peso muerto", MuscleGroup::Legs))
            .await
            .unwrap();

        let legs: Vec<String> = service
            .list(&user, Some(MuscleGroup::Legs))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(legs, vec!["Peso muerto", "Sentadilla"]);
        assert_eq!(service.list(&user, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let service = ExerciseService::new(Arc::new(InMemoryRepository::new()));
        let user = ActiveUser::for_tests(UserId::new(1), "ana");
        let mut bad = draft("Sentadilla", MuscleGroup::Legs);
        bad.video_url = Some("no es una url".into());
        let err = service.create(&user, bad).await.unwrap_err();
        assert!(matches!(
            err,
            TrackingError::Validation(fitness_core::Error::Exercise(
                ExerciseError::InvalidUrl { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_ids() {
        let service = ExerciseService::new(Arc::new(InMemoryRepository::new()));
        let user = ActiveUser::for_tests(UserId::new(1), "ana");
        let missing = ExerciseId::new(42);
        assert!(matches!(
            service
                .update(&user, missing, draft("X", MuscleGroup::Abs))
                .await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.delete(&user, missing).await,
            Err(TrackingError::NotFound)
        ));
    }
}
