use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

/// Declares a row identifier backed by the store-assigned integer key.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

row_id!(
    /// Unique identifier for a registered user
    UserId
);
row_id!(
    /// Unique identifier for a body metric entry
    BodyMetricId
);
row_id!(
    /// Unique identifier for a catalog exercise
    ExerciseId
);
row_id!(
    /// Unique identifier for a logged workout
    WorkoutId
);
row_id!(
    /// Unique identifier for an exercise line inside a workout
    WorkoutExerciseId
);
row_id!(
    /// Unique identifier for a catalog food
    FoodId
);
row_id!(
    /// Unique identifier for a meal log entry
    MealLogId
);
row_id!(
    /// Unique identifier for a goal
    GoalId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display() {
        let id = UserId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "UserId(42)");
    }

    #[test]
    fn goal_id_from_str() {
        let id: GoalId = "123".parse().unwrap();
        assert_eq!(id, GoalId::new(123));
    }

    #[test]
    fn workout_id_from_str_invalid() {
        let err = "not-a-number".parse::<WorkoutId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse WorkoutId from string");
    }
}
