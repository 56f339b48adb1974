use std::sync::Arc;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use fitness_core::model::{
    Food, FoodDraft, FoodId, MealDraft, MealEntry, MealLogId, Nutrients,
};
use fitness_core::rounding::round2;
use fitness_core::time::start_of_day;
use storage::repository::{DateRange, FoodRepository, MealLogRepository, MealQuery};
use tracing::debug;

use crate::error::TrackingError;
use crate::session_guard::ActiveUser;

/// Food catalog and meal logging.
#[derive(Clone)]
pub struct NutritionService {
    foods: Arc<dyn FoodRepository>,
    meals: Arc<dyn MealLogRepository>,
}

impl NutritionService {
    #[must_use]
    pub fn new(foods: Arc<dyn FoodRepository>, meals: Arc<dyn MealLogRepository>) -> Self {
        Self { foods, meals }
    }

    // ─── Food catalog ──────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for a blank name or a negative nutrient.
    pub async fn add_food(
        &self,
        user: &ActiveUser<'_>,
        draft: FoodDraft,
    ) -> Result<Food, TrackingError> {
        let valid = draft.validate()?;
        let id = self.foods.insert_food(valid.clone()).await?;
        debug!(%id, user_id = %user.user_id(), "added food to catalog");
        Ok(valid.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` for an unknown id.
    pub async fn get_food(
        &self,
        _user: &ActiveUser<'_>,
        id: FoodId,
    ) -> Result<Food, TrackingError> {
        self.foods.get_food(id).await?.ok_or(TrackingError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for invalid fields and
    /// `TrackingError::NotFound` for an unknown id.
    pub async fn update_food(
        &self,
        _user: &ActiveUser<'_>,
        id: FoodId,
        draft: FoodDraft,
    ) -> Result<Food, TrackingError> {
        let food = draft.validate()?.assign_id(id);
        self.foods.update_food(&food).await?;
        Ok(food)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::InUse` while a meal references the food and
    /// `TrackingError::NotFound` for an unknown id.
    pub async fn delete_food(
        &self,
        user: &ActiveUser<'_>,
        id: FoodId,
    ) -> Result<(), TrackingError> {
        if !self.foods.delete_food(id).await? {
            return Err(TrackingError::NotFound);
        }
        debug!(%id, user_id = %user.user_id(), "removed food from catalog");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn list_foods(&self, _user: &ActiveUser<'_>) -> Result<Vec<Food>, TrackingError> {
        Ok(self.foods.list_foods().await?)
    }

    // ─── Meal logs ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for a non-positive quantity and
    /// `TrackingError::NotFound` if the food does not exist.
    pub async fn log_meal(
        &self,
        user: &ActiveUser<'_>,
        draft: MealDraft,
    ) -> Result<MealEntry, TrackingError> {
        let draft = draft.validate()?;
        let id = self.meals.insert_meal(user.user_id(), draft).await?;
        self.get_meal(user, id).await
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if the meal is missing or not owned.
    pub async fn get_meal(
        &self,
        user: &ActiveUser<'_>,
        id: MealLogId,
    ) -> Result<MealEntry, TrackingError> {
        self.meals
            .get_meal(user.user_id(), id)
            .await?
            .ok_or(TrackingError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::Validation` for a non-positive quantity and
    /// `TrackingError::NotFound` if the meal or the new food is missing.
    pub async fn update_meal(
        &self,
        user: &ActiveUser<'_>,
        id: MealLogId,
        draft: MealDraft,
    ) -> Result<MealEntry, TrackingError> {
        let mut meal = self.get_meal(user, id).await?.meal;
        meal.update(draft.food_id, draft.logged_at, draft.quantity_g)?;
        self.meals.update_meal(&meal).await?;
        self.get_meal(user, id).await
    }

    /// # Errors
    ///
    /// Returns `TrackingError::NotFound` if nothing was deleted.
    pub async fn delete_meal(
        &self,
        user: &ActiveUser<'_>,
        id: MealLogId,
    ) -> Result<(), TrackingError> {
        if self.meals.delete_meal(user.user_id(), id).await? {
            Ok(())
        } else {
            Err(TrackingError::NotFound)
        }
    }

    /// Meals newest first, each joined with its food.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn history(
        &self,
        user: &ActiveUser<'_>,
        query: &MealQuery,
    ) -> Result<Vec<MealEntry>, TrackingError> {
        Ok(self.meals.list_meals(user.user_id(), query).await?)
    }

    /// Nutrients eaten since midnight (UTC) of `now`'s day.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn daily_totals(
        &self,
        user: &ActiveUser<'_>,
        now: DateTime<Utc>,
    ) -> Result<Nutrients, TrackingError> {
        let query = MealQuery {
            range: DateRange::since(start_of_day(now)),
            food_ids: Vec::new(),
        };
        let entries = self.history(user, &query).await?;
        let portions: Vec<Nutrients> = entries.iter().map(MealEntry::raw_nutrients).collect();
        Ok(Nutrients::total(&portions))
    }

    /// Calories per calendar day (UTC) inside `range`, oldest day first.
    ///
    /// Days without meals are left out.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` if the query fails.
    pub async fn daily_calories(
        &self,
        user: &ActiveUser<'_>,
        range: DateRange,
    ) -> Result<Vec<(NaiveDate, f64)>, TrackingError> {
        let query = MealQuery {
            range,
            food_ids: Vec::new(),
        };
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for entry in self.history(user, &query).await? {
            *days.entry(entry.meal.logged_at().date_naive()).or_default() +=
                entry.raw_nutrients().calories;
        }
        debug!(user_id = %user.user_id(), days = days.len(), "daily calories");
        Ok(days.into_iter().map(|(day, kcal)| (day, round2(kcal))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitness_core::model::{Email, UserId, Username};
    use fitness_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, NewUserRecord, UserRepository};

    use crate::error::ErrorKind;

    async fn setup() -> (NutritionService, ActiveUser<'static>, ActiveUser<'static>) {
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
            NutritionService::new(Arc::new(repo.clone()), Arc::new(repo)),
            ActiveUser::for_tests(ids[0], "ana"),
            ActiveUser::for_tests(ids[1], "bea"),
        )
    }

    fn oats() -> FoodDraft {
        FoodDraft {
            name: "Avena".into(),
            per_100g: Nutrients {
                calories: 389.0,
                protein: 16.9,
                carbs: 66.3,
                fat: 6.9,
            },
        }
    }

    #[tokio::test]
    async fn meal_entry_scales_nutrients() {
        let (service, ana, _) = setup().await;
        let food = service.add_food(&ana, oats()).await.unwrap();
        let entry = service
            .log_meal(
                &ana,
                MealDraft {
                    food_id: food.id,
                    logged_at: fixed_now(),
                    quantity_g: 50.0,
                },
            )
            .await
            .unwrap();
        let n = entry.nutrients();
        assert_eq!(n.calories, 194.5);
        assert_eq!(n.protein, 8.45);
        assert_eq!(n.carbs, 33.15);
        assert_eq!(n.fat, 3.45);
    }

    #[tokio::test]
    async fn daily_totals_ignore_yesterday() {
        let (service, ana, _) = setup().await;
        let food = service.add_food(&ana, oats()).await.unwrap();
        let now = fixed_now();
        for (at, qty) in [(now, 100.0), (now - Duration::days(1), 300.0)] {
            service
                .log_meal(
                    &ana,
                    MealDraft {
                        food_id: food.id,
                        logged_at: at,
                        quantity_g: qty,
                    },
                )
                .await
                .unwrap();
        }
        let totals = service.daily_totals(&ana, now).await.unwrap();
        assert_eq!(totals.calories, 389.0);
    }

    #[tokio::test]
    async fn daily_totals_sum_before_rounding() {
        let (service, ana, _) = setup().await;
        let trace = service
            .add_food(
                &ana,
                FoodDraft {
                    name: "Especias".into(),
                    per_100g: Nutrients {
                        calories: 1.0,
                        ..Nutrients::default()
                    },
                },
            )
            .await
            .unwrap();
        for _ in 0..3 {
            service
                .log_meal(
                    &ana,
                    MealDraft {
                        food_id: trace.id,
                        logged_at: fixed_now(),
                        quantity_g: 0.4,
                    },
                )
                .await
                .unwrap();
        }
        let totals = service.daily_totals(&ana, fixed_now()).await.unwrap();
        let repo_total = service
            .meals
            .calories_since(ana.user_id(), start_of_day(fixed_now()))
            .await
            .unwrap();
        assert_eq!(totals.calories, 0.01);
        assert_eq!(totals.calories, round2(repo_total));
    }

    #[tokio::test]
    async fn daily_calories_groups_by_day() {
        let (service, ana, bea) = setup().await;
        let food = service.add_food(&ana, oats()).await.unwrap();
        let now = fixed_now();
        let meals = [
            (&ana, now, 100.0),
            (&ana, now - Duration::hours(1), 50.0),
            (&ana, now - Duration::days(1), 200.0),
            (&ana, now - Duration::days(3), 100.0),
            (&ana, now - Duration::days(10), 100.0),
            (&bea, now, 400.0),
        ];
        for (user, at, qty) in meals {
            service
                .log_meal(
                    user,
                    MealDraft {
                        food_id: food.id,
                        logged_at: at,
                        quantity_g: qty,
                    },
                )
                .await
                .unwrap();
        }

        let days = service
            .daily_calories(&ana, DateRange::since(now - Duration::days(7)))
            .await
            .unwrap();
        let day = |offset: i64| (now - Duration::days(offset)).date_naive();
        assert_eq!(days, vec![(day(3), 389.0), (day(1), 778.0), (day(0), 583.5)]);
        let bea_days = service
            .daily_calories(&bea, DateRange::all())
            .await
            .unwrap();
        assert_eq!(bea_days, vec![(day(0), 1556.0)]);
    }

    #[tokio::test]
    async fn rejects_bad_quantity_and_unknown_food() {
        let (service, ana, _) = setup().await;
        let food = service.add_food(&ana, oats()).await.unwrap();

        let err = service
            .log_meal(
                &ana,
                MealDraft {
                    food_id: food.id,
                    logged_at: fixed_now(),
                    quantity_g: 0.0,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .log_meal(
                &ana,
                MealDraft {
                    food_id: FoodId::new(77),
                    logged_at: fixed_now(),
                    quantity_g: 100.0,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn meals_are_private_and_foods_in_use_are_kept() {
        let (service, ana, bea) = setup().await;
        let food = service.add_food(&ana, oats()).await.unwrap();
        let entry = service
            .log_meal(
                &ana,
                MealDraft {
                    food_id: food.id,
                    logged_at: fixed_now(),
                    quantity_g: 80.0,
                },
            )
            .await
            .unwrap();
        let meal_id = entry.meal.id();

        assert!(matches!(
            service.get_meal(&bea, meal_id).await,
            Err(TrackingError::NotFound)
        ));
        assert!(matches!(
            service.delete_meal(&bea, meal_id).await,
            Err(TrackingError::NotFound)
        ));
        assert!(
            service
                .history(&bea, &MealQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            service.delete_food(&ana, food.id).await,
            Err(TrackingError::InUse)
        ));

        let updated = service
            .update_meal(
                &ana,
                meal_id,
                MealDraft {
                    food_id: food.id,
                    logged_at: fixed_now(),
                    quantity_g: 120.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.meal.quantity_g(), 120.0);

        service.delete_meal(&ana, meal_id).await.unwrap();
        service.delete_food(&ana, food.id).await.unwrap();
    }
}
