use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::FoodId;
use crate::rounding::round2;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum FoodError {
    #[error("food name cannot be empty")]
    EmptyName,

    #[error("{field} per 100 g must be a non-negative number, got {value}")]
    InvalidNutrient { field: &'static str, value: f64 },
}

/// Nutrient amounts. Per 100 g on a food, absolute on a meal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrients {
    /// Unrounded amount contained in `quantity_g` grams, given per-100 g values.
    #[must_use]
    pub fn scaled(&self, quantity_g: f64) -> Self {
        let scale = quantity_g / 100.0;
        Self {
            calories: self.calories * scale,
            protein: self.protein * scale,
            carbs: self.carbs * scale,
            fat: self.fat * scale,
        }
    }

    /// [`Nutrients::scaled`] rounded to two decimals, for showing one portion.
    #[must_use]
    pub fn for_quantity(&self, quantity_g: f64) -> Self {
        let n = self.scaled(quantity_g);
        Self {
            calories: round2(n.calories),
            protein: round2(n.protein),
            carbs: round2(n.carbs),
            fat: round2(n.fat),
        }
    }

    /// Sum of several amounts, rounded once at the end.
    ///
    /// Feed it [`Nutrients::scaled`] portions so rounding happens only here.
    #[must_use]
    pub fn total<'a>(items: impl IntoIterator<Item = &'a Nutrients>) -> Self {
        let sum = items
            .into_iter()
            .fold(Self::default(), |acc, n| Self {
                calories: acc.calories + n.calories,
                protein: acc.protein + n.protein,
                carbs: acc.carbs + n.carbs,
                fat: acc.fat + n.fat,
            });
        Self {
            calories: round2(sum.calories),
            protein: round2(sum.protein),
            carbs: round2(sum.carbs),
            fat: round2(sum.fat),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodDraft {
    pub name: String,
    pub per_100g: Nutrients,
}

impl FoodDraft {
    /// # Errors
    ///
    /// Returns `FoodError` for a blank name or a negative/non-finite nutrient.
    pub fn validate(self) -> Result<ValidFood, FoodError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FoodError::EmptyName);
        }
        let n = self.per_100g;
        for (field, value) in [
            ("calories", n.calories),
            ("protein", n.protein),
            ("carbs", n.carbs),
            ("fat", n.fat),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FoodError::InvalidNutrient { field, value });
            }
        }
        Ok(ValidFood {
            name,
            per_100g: n,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidFood {
    pub name: String,
    pub per_100g: Nutrients,
}

impl ValidFood {
    #[must_use]
    pub fn assign_id(self, id: FoodId) -> Food {
        Food {
            id,
            name: self.name,
            per_100g: self.per_100g,
        }
    }
}

/// Shared catalog food with nutrients per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub per_100g: Nutrients,
}
