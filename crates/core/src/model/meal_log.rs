use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::food::{Food, Nutrients};
use crate::model::ids::{FoodId, MealLogId, UserId};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MealLogError {
    #[error("quantity must be a positive number of grams, got {0}")]
    InvalidQuantity(f64),
}

fn check_quantity(quantity_g: f64) -> Result<f64, MealLogError> {
    if !quantity_g.is_finite() || quantity_g <= 0.0 {
        return Err(MealLogError::InvalidQuantity(quantity_g));
    }
    Ok(quantity_g)
}

/// One eaten portion of a catalog food.
#[derive(Debug, Clone, PartialEq)]
pub struct MealLog {
    id: MealLogId,
    user_id: UserId,
    food_id: FoodId,
    logged_at: DateTime<Utc>,
    quantity_g: f64,
}

impl MealLog {
    /// # Errors
    ///
    /// Returns `MealLogError::InvalidQuantity` for zero, negative or non-finite grams.
    pub fn new(
        id: MealLogId,
        user_id: UserId,
        food_id: FoodId,
        logged_at: DateTime<Utc>,
        quantity_g: f64,
    ) -> Result<Self, MealLogError> {
        Ok(Self {
            id,
            user_id,
            food_id,
            logged_at,
            quantity_g: check_quantity(quantity_g)?,
        })
    }

    #[must_use]
    pub fn id(&self) -> MealLogId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn food_id(&self) -> FoodId {
        self.food_id
    }

    #[must_use]
    pub fn logged_at(&self) -> DateTime<Utc> {
        self.logged_at
    }

    #[must_use]
    pub fn quantity_g(&self) -> f64 {
        self.quantity_g
    }

    /// # Errors
    ///
    /// Returns `MealLogError::InvalidQuantity` and keeps the previous values.
    pub fn update(
        &mut self,
        food_id: FoodId,
        logged_at: DateTime<Utc>,
        quantity_g: f64,
    ) -> Result<(), MealLogError> {
        self.quantity_g = check_quantity(quantity_g)?;
        self.food_id = food_id;
        self.logged_at = logged_at;
        Ok(())
    }
}

/// A meal joined with its food, as shown in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct MealEntry {
    pub meal: MealLog,
    pub food: Food,
}

impl MealEntry {
    /// Nutrients actually eaten in this portion.
    #[must_use]
    pub fn nutrients(&self) -> Nutrients {
        self.food.per_100g.for_quantity(self.meal.quantity_g())
    }

    /// Like [`MealEntry::nutrients`] but unrounded, for summing.
    #[must_use]
    pub fn raw_nutrients(&self) -> Nutrients {
        self.food.per_100g.scaled(self.meal.quantity_g())
    }
}

/// Input for a new meal log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealDraft {
    pub food_id: FoodId,
    pub logged_at: DateTime<Utc>,
    pub quantity_g: f64,
}

impl MealDraft {
    /// # Errors
    ///
    /// Returns `MealLogError::InvalidQuantity` for non-positive grams.
    pub fn validate(self) -> Result<Self, MealLogError> {
        check_quantity(self.quantity_g)?;
        Ok(self)
    }
}
