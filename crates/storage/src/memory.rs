use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitness_core::model::{
    BodyMetric, BodyMetricId, Email, Exercise, ExerciseId, Food, FoodId, Goal, GoalDraft, GoalId,
    GoalStatus, MealDraft, MealEntry, MealLog, MealLogId, MuscleGroup, User, UserId, ValidExercise,
    ValidFood, Workout, WorkoutExercise, WorkoutExerciseDraft, WorkoutExerciseId, WorkoutHeader,
    WorkoutId,
};

use crate::repository::{
    BodyMetricRepository, DateRange, ExerciseRepository, FoodRepository, GoalRepository,
    MealLogRepository, MealQuery, NewBodyMetricRecord, NewUserRecord, NewWorkoutRecord,
    StorageError, UniqueField, UserRepository, WorkoutQuery, WorkoutRepository,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    body_metrics: BTreeMap<BodyMetricId, BodyMetric>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    workouts: BTreeMap<WorkoutId, Workout>,
    foods: BTreeMap<FoodId, Food>,
    meals: BTreeMap<MealLogId, MealLog>,
    goals: BTreeMap<GoalId, Goal>,
}

/// Keys follow the `SQLite` rowid rule: one past the current maximum.
fn next_id(last: Option<u64>) -> u64 {
    last.map_or(1, |v| v + 1)
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username().as_str() == username && Some(u.id()) != except)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email().as_str() == email && Some(u.id()) != except)
    }

    fn build_lines(
        &self,
        workout_id: WorkoutId,
        drafts: Vec<WorkoutExerciseDraft>,
    ) -> Result<Vec<WorkoutExercise>, StorageError> {
        let mut next = next_id(
            self.workouts
                .values()
                .flat_map(|w| w.exercises.iter())
                .map(|line| line.id.value())
                .max(),
        );
        let mut lines = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.into_iter().enumerate() {
            if !self.exercises.contains_key(&draft.exercise_id) {
                return Err(StorageError::NotFound);
            }
            let position = u32::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            lines.push(WorkoutExercise {
                id: WorkoutExerciseId::new(next),
                workout_id,
                exercise_id: draft.exercise_id,
                position,
                sets: draft.sets,
                reps: draft.reps,
                weight_kg: draft.weight_kg,
                notes: draft.notes,
            });
            next += 1;
        }
        Ok(lines)
    }

    fn entry(&self, meal: &MealLog) -> Result<MealEntry, StorageError> {
        let food = self
            .foods
            .get(&meal.food_id())
            .cloned()
            .ok_or_else(|| StorageError::Serialization("meal references missing food".into()))?;
        Ok(MealEntry {
            meal: meal.clone(),
            food,
        })
    }
}

/// Simple in-memory repository for prototyping and tests.
///
/// All tables share one lock, so every operation is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let mut tables = self.lock()?;
        if tables.username_taken(user.username.as_str(), None) {
            return Err(StorageError::Conflict(UniqueField::Username));
        }
        if tables.email_taken(user.email.as_str(), None) {
            return Err(StorageError::Conflict(UniqueField::Email));
        }
        let id = UserId::new(next_id(tables.users.keys().next_back().map(UserId::value)));
        let stored = User::from_persisted(
            id,
            user.username.as_str(),
            user.email.as_str(),
            user.full_name,
            user.password_hash,
            user.created_at,
        )
        .map_err(ser)?;
        tables.users.insert(id, stored);
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username().as_str() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email().as_str() == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        full_name: Option<String>,
        email: &Email,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if tables.email_taken(email.as_str(), Some(id)) {
            return Err(StorageError::Conflict(UniqueField::Email));
        }
        let current = tables.users.get(&id).ok_or(StorageError::NotFound)?;
        let updated = User::from_persisted(
            id,
            current.username().as_str(),
            email.as_str(),
            full_name,
            current.password_hash().to_string(),
            current.created_at(),
        )
        .map_err(ser)?;
        tables.users.insert(id, updated);
        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let current = tables.users.get(&id).ok_or(StorageError::NotFound)?;
        let updated = User::from_persisted(
            id,
            current.username().as_str(),
            current.email().as_str(),
            current.full_name().map(str::to_string),
            password_hash.to_string(),
            current.created_at(),
        )
        .map_err(ser)?;
        tables.users.insert(id, updated);
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, StorageError> {
        Ok(self.lock()?.users.len() as u64)
    }
}

//
// ─── BODY METRICS ──────────────────────────────────────────────────────────────
//

#[async_trait]
impl BodyMetricRepository for InMemoryRepository {
    async fn insert_metric(
        &self,
        metric: NewBodyMetricRecord,
    ) -> Result<BodyMetricId, StorageError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&metric.user_id) {
            return Err(StorageError::NotFound);
        }
        let id = BodyMetricId::new(next_id(
            tables.body_metrics.keys().next_back().map(BodyMetricId::value),
        ));
        tables.body_metrics.insert(
            id,
            BodyMetric::new(id, metric.user_id, metric.recorded_at, metric.measurement),
        );
        Ok(id)
    }

    async fn get_metric(
        &self,
        user_id: UserId,
        id: BodyMetricId,
    ) -> Result<Option<BodyMetric>, StorageError> {
        Ok(self
            .lock()?
            .body_metrics
            .get(&id)
            .filter(|m| m.user_id() == user_id)
            .cloned())
    }

    async fn update_metric(&self, metric: &BodyMetric) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        match tables.body_metrics.get_mut(&metric.id()) {
            Some(existing) if existing.user_id() == metric.user_id() => {
                *existing = metric.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn delete_metric(&self, user_id: UserId, id: BodyMetricId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let owned = tables
            .body_metrics
            .get(&id)
            .is_some_and(|m| m.user_id() == user_id);
        Ok(owned && tables.body_metrics.remove(&id).is_some())
    }

    async fn list_metrics(
        &self,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<BodyMetric>, StorageError> {
        let tables = self.lock()?;
        let mut metrics: Vec<BodyMetric> = tables
            .body_metrics
            .values()
            .filter(|m| m.user_id() == user_id && range.contains(m.recorded_at()))
            .cloned()
            .collect();
        metrics.sort_by_key(|m| Reverse((m.recorded_at(), m.id())));
        Ok(metrics)
    }

    async fn latest_metric(&self, user_id: UserId) -> Result<Option<BodyMetric>, StorageError> {
        let tables = self.lock()?;
        Ok(tables
            .body_metrics
            .values()
            .filter(|m| m.user_id() == user_id)
            .max_by_key(|m| (m.recorded_at(), m.id()))
            .cloned())
    }
}

//
// ─── EXERCISE CATALOG ──────────────────────────────────────────────────────────
//

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn insert_exercise(&self, exercise: ValidExercise) -> Result<ExerciseId, StorageError> {
        let mut tables = self.lock()?;
        let id = ExerciseId::new(next_id(
            tables.exercises.keys().next_back().map(ExerciseId::value),
        ));
        tables.exercises.insert(id, exercise.assign_id(id));
        Ok(id)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        Ok(self.lock()?.exercises.get(&id).cloned())
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let existing = tables
            .exercises
            .get_mut(&exercise.id)
            .ok_or(StorageError::NotFound)?;
        *existing = exercise.clone();
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let in_use = tables
            .workouts
            .values()
            .flat_map(|w| w.exercises.iter())
            .any(|line| line.exercise_id == id);
        if in_use {
            return Err(StorageError::Referenced);
        }
        Ok(tables.exercises.remove(&id).is_some())
    }

    async fn list_exercises(
        &self,
        muscle_group: Option<MuscleGroup>,
    ) -> Result<Vec<Exercise>, StorageError> {
        let tables = self.lock()?;
        let mut exercises: Vec<Exercise> = tables
            .exercises
            .values()
            .filter(|e| muscle_group.is_none_or(|g| e.muscle_group == g))
            .cloned()
            .collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(exercises)
    }
}

//
// ─── WORKOUTS ──────────────────────────────────────────────────────────────────
//

#[async_trait]
impl WorkoutRepository for InMemoryRepository {
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<WorkoutId, StorageError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&workout.user_id) {
            return Err(StorageError::NotFound);
        }
        let id = WorkoutId::new(next_id(
            tables.workouts.keys().next_back().map(WorkoutId::value),
        ));
        let exercises = tables.build_lines(id, workout.exercises)?;
        tables.workouts.insert(
            id,
            Workout {
                id,
                user_id: workout.user_id,
                header: workout.header,
                exercises,
            },
        );
        Ok(id)
    }

    async fn get_workout(
        &self,
        user_id: UserId,
        id: WorkoutId,
    ) -> Result<Option<Workout>, StorageError> {
        Ok(self
            .lock()?
            .workouts
            .get(&id)
            .filter(|w| w.user_id == user_id)
            .cloned())
    }

    async fn update_workout_header(
        &self,
        user_id: UserId,
        id: WorkoutId,
        header: &WorkoutHeader,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        match tables.workouts.get_mut(&id) {
            Some(workout) if workout.user_id == user_id => {
                workout.header = header.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn replace_workout_exercises(
        &self,
        user_id: UserId,
        id: WorkoutId,
        exercises: Vec<WorkoutExerciseDraft>,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if !tables.workouts.get(&id).is_some_and(|w| w.user_id == user_id) {
            return Err(StorageError::NotFound);
        }
        let lines = tables.build_lines(id, exercises)?;
        if let Some(workout) = tables.workouts.get_mut(&id) {
            workout.exercises = lines;
        }
        Ok(())
    }

    async fn delete_workout(&self, user_id: UserId, id: WorkoutId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let owned = tables.workouts.get(&id).is_some_and(|w| w.user_id == user_id);
        Ok(owned && tables.workouts.remove(&id).is_some())
    }

    async fn list_workouts(
        &self,
        user_id: UserId,
        query: &WorkoutQuery,
    ) -> Result<Vec<Workout>, StorageError> {
        let tables = self.lock()?;
        let needle = query.name_contains.as_deref().map(str::to_lowercase);
        let mut workouts: Vec<Workout> = tables
            .workouts
            .values()
            .filter(|w| w.user_id == user_id && query.range.contains(w.header.performed_at))
            .filter(|w| {
                needle
                    .as_deref()
                    .is_none_or(|n| w.header.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        workouts.sort_by_key(|w| Reverse((w.header.performed_at, w.id)));
        if let Some(limit) = query.limit {
            workouts.truncate(limit as usize);
        }
        Ok(workouts)
    }

    async fn count_workouts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let tables = self.lock()?;
        let count = tables
            .workouts
            .values()
            .filter(|w| w.user_id == user_id && w.header.performed_at >= since)
            .count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}

//
// ─── FOOD CATALOG ──────────────────────────────────────────────────────────────
//

#[async_trait]
impl FoodRepository for InMemoryRepository {
    async fn insert_food(&self, food: ValidFood) -> Result<FoodId, StorageError> {
        let mut tables = self.lock()?;
        let id = FoodId::new(next_id(tables.foods.keys().next_back().map(FoodId::value)));
        tables.foods.insert(id, food.assign_id(id));
        Ok(id)
    }

    async fn get_food(&self, id: FoodId) -> Result<Option<Food>, StorageError> {
        Ok(self.lock()?.foods.get(&id).cloned())
    }

    async fn update_food(&self, food: &Food) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let existing = tables.foods.get_mut(&food.id).ok_or(StorageError::NotFound)?;
        *existing = food.clone();
        Ok(())
    }

    async fn delete_food(&self, id: FoodId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        if tables.meals.values().any(|m| m.food_id() == id) {
            return Err(StorageError::Referenced);
        }
        Ok(tables.foods.remove(&id).is_some())
    }

    async fn list_foods(&self) -> Result<Vec<Food>, StorageError> {
        let tables = self.lock()?;
        let mut foods: Vec<Food> = tables.foods.values().cloned().collect();
        foods.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(foods)
    }
}

//
// ─── MEAL LOGS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
impl MealLogRepository for InMemoryRepository {
    async fn insert_meal(
        &self,
        user_id: UserId,
        meal: MealDraft,
    ) -> Result<MealLogId, StorageError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) || !tables.foods.contains_key(&meal.food_id) {
            return Err(StorageError::NotFound);
        }
        let id = MealLogId::new(next_id(tables.meals.keys().next_back().map(MealLogId::value)));
        let stored = MealLog::new(id, user_id, meal.food_id, meal.logged_at, meal.quantity_g)
            .map_err(ser)?;
        tables.meals.insert(id, stored);
        Ok(id)
    }

    async fn get_meal(
        &self,
        user_id: UserId,
        id: MealLogId,
    ) -> Result<Option<MealEntry>, StorageError> {
        let tables = self.lock()?;
        tables
            .meals
            .get(&id)
            .filter(|m| m.user_id() == user_id)
            .map(|m| tables.entry(m))
            .transpose()
    }

    async fn update_meal(&self, meal: &MealLog) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if !tables.foods.contains_key(&meal.food_id()) {
            return Err(StorageError::NotFound);
        }
        match tables.meals.get_mut(&meal.id()) {
            Some(existing) if existing.user_id() == meal.user_id() => {
                *existing = meal.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn delete_meal(&self, user_id: UserId, id: MealLogId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let owned = tables.meals.get(&id).is_some_and(|m| m.user_id() == user_id);
        Ok(owned && tables.meals.remove(&id).is_some())
    }

    async fn list_meals(
        &self,
        user_id: UserId,
        query: &MealQuery,
    ) -> Result<Vec<MealEntry>, StorageError> {
        let tables = self.lock()?;
        let mut meals: Vec<&MealLog> = tables
            .meals
            .values()
            .filter(|m| m.user_id() == user_id && query.range.contains(m.logged_at()))
            .filter(|m| query.food_ids.is_empty() || query.food_ids.contains(&m.food_id()))
            .collect();
        meals.sort_by_key(|m| Reverse((m.logged_at(), m.id())));
        meals.into_iter().map(|m| tables.entry(m)).collect()
    }

    async fn calories_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<f64, StorageError> {
        let tables = self.lock()?;
        let mut total = 0.0;
        for meal in tables
            .meals
            .values()
            .filter(|m| m.user_id() == user_id && m.logged_at() >= since)
        {
            let entry = tables.entry(meal)?;
            total += meal.quantity_g() / 100.0 * entry.food.per_100g.calories;
        }
        Ok(total)
    }
}

//
// ─── GOALS ─────────────────────────────────────────────────────────────────────
//

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn insert_goal(&self, user_id: UserId, goal: GoalDraft) -> Result<GoalId, StorageError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StorageError::NotFound);
        }
        let id = GoalId::new(next_id(tables.goals.keys().next_back().map(GoalId::value)));
        let stored = Goal::new(id, user_id, goal).map_err(ser)?;
        tables.goals.insert(id, stored);
        Ok(id)
    }

    async fn get_goal(&self, user_id: UserId, id: GoalId) -> Result<Option<Goal>, StorageError> {
        Ok(self
            .lock()?
            .goals
            .get(&id)
            .filter(|g| g.user_id() == user_id)
            .cloned())
    }

    async fn update_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        match tables.goals.get_mut(&goal.id()) {
            Some(existing) if existing.user_id() == goal.user_id() => {
                *existing = goal.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let owned = tables.goals.get(&id).is_some_and(|g| g.user_id() == user_id);
        Ok(owned && tables.goals.remove(&id).is_some())
    }

    async fn list_goals(
        &self,
        user_id: UserId,
        status: GoalStatus,
    ) -> Result<Vec<Goal>, StorageError> {
        let tables = self.lock()?;
        let completed = status == GoalStatus::Completed;
        let mut goals: Vec<Goal> = tables
            .goals
            .values()
            .filter(|g| g.user_id() == user_id && g.is_completed() == completed)
            .cloned()
            .collect();
        match status {
            GoalStatus::Active => {
                goals.sort_by_key(|g| (g.target_date().is_none(), g.target_date(), g.id()));
            }
            GoalStatus::Completed => {
                goals.sort_by_key(|g| Reverse((g.completed_date(), g.id())));
            }
        }
        Ok(goals)
    }
}
