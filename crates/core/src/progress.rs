//! Goal progress math.
//!
//! Services fetch the aggregate a goal's category asks for; this module turns
//! that aggregate into a display-ready percentage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Goal, GoalCategory, GoalId};
use crate::rounding::clamp_percent;
use crate::time::start_of_day;

/// The data a category's progress is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Weight of the most recent body metric.
    LatestWeight,
    /// Calories of meals logged since the given instant.
    CaloriesSince(DateTime<Utc>),
    /// Number of workouts performed since the given instant.
    WorkoutsSince(DateTime<Utc>),
}

impl GoalCategory {
    /// Aggregate that drives progress for this category at `now`.
    #[must_use]
    pub fn aggregate(self, now: DateTime<Utc>) -> Aggregate {
        match self {
            GoalCategory::Weight => Aggregate::LatestWeight,
            GoalCategory::Nutrition => Aggregate::CaloriesSince(start_of_day(now)),
            GoalCategory::Exercise => Aggregate::WorkoutsSince(start_of_day(now)),
        }
    }
}

/// Value fetched for an [`Aggregate`].
///
/// `None` means there is nothing to measure yet (no body metric logged).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateValue(pub Option<f64>);

/// Percentage of `target` reached by `value`, clamped to `[0, 100]` and
/// rounded to two decimals.
///
/// Missing data and absent, zero, negative or non-finite targets give `0.0`.
#[must_use]
pub fn percent_of_target(value: AggregateValue, target: Option<f64>) -> f64 {
    let Some(target) = target.filter(|t| t.is_finite() && *t > 0.0) else {
        return 0.0;
    };
    let Some(value) = value.0 else {
        return 0.0;
    };
    clamp_percent(100.0 * value / target)
}

/// Evaluated progress for one goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_id: GoalId,
    pub category: GoalCategory,
    /// Raw aggregate the percentage was computed from, if any.
    pub current: Option<f64>,
    pub target: Option<f64>,
    pub percent: f64,
}

impl GoalProgress {
    #[must_use]
    pub fn evaluate(goal: &Goal, value: AggregateValue) -> Self {
        Self {
            goal_id: goal.id(),
            category: goal.category(),
            current: value.0,
            target: goal.target_value(),
            percent: percent_of_target(value, goal.target_value()),
        }
    }

    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.percent >= 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn pct(value: f64, target: f64) -> f64 {
        percent_of_target(AggregateValue(Some(value)), Some(target))
    }

    #[test]
    fn category_picks_its_aggregate() {
        let now = fixed_now();
        let midnight = start_of_day(now);
        assert_eq!(GoalCategory::Weight.aggregate(now), Aggregate::LatestWeight);
        assert_eq!(
            GoalCategory::Nutrition.aggregate(now),
            Aggregate::CaloriesSince(midnight)
        );
        assert_eq!(
            GoalCategory::Exercise.aggregate(now),
            Aggregate::WorkoutsSince(midnight)
        );
    }

    #[test]
    fn clamps_over_target_to_hundred() {
        assert_eq!(pct(2500.0, 2000.0), 100.0);
        assert_eq!(pct(1500.0, 2000.0), 75.0);
        assert_eq!(pct(1.0, 3.0), 33.33);
    }

    #[test]
    fn degenerate_targets_yield_zero() {
        let v = AggregateValue(Some(10.0));
        assert_eq!(percent_of_target(v, Some(0.0)), 0.0);
        assert_eq!(percent_of_target(v, None), 0.0);
        assert_eq!(percent_of_target(v, Some(-5.0)), 0.0);
        assert_eq!(percent_of_target(v, Some(f64::NAN)), 0.0);
        assert_eq!(percent_of_target(AggregateValue(None), Some(70.0)), 0.0);
    }

    #[test]
    fn monotonic_and_bounded() {
        let target = 7.0;
        let mut previous = 0.0;
        for step in 0..40 {
            let p = pct(f64::from(step) * 0.5, target);
            assert!((0.0..=100.0).contains(&p));
            assert!(p >= previous);
            previous = p;
        }
    }
}
