use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{BodyMetricId, UserId};
use crate::rounding::round2;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum BodyMetricError {
    #[error("weight must be a positive number of kilograms, got {0}")]
    InvalidWeight(f64),

    #[error("height must be a positive number of centimetres, got {0}")]
    InvalidHeight(f64),
}

/// Body-mass index from kilograms and centimetres, rounded to two decimals.
///
/// # Errors
///
/// Returns `BodyMetricError` if either measurement is not a positive finite number.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<f64, BodyMetricError> {
    check_measurements(weight_kg, height_cm)?;
    let height_m = height_cm / 100.0;
    Ok(round2(weight_kg / (height_m * height_m)))
}

fn check_measurements(weight_kg: f64, height_cm: f64) -> Result<(), BodyMetricError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(BodyMetricError::InvalidWeight(weight_kg));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(BodyMetricError::InvalidHeight(height_cm));
    }
    Ok(())
}

/// Validated measurements, before the store assigns an id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    weight_kg: f64,
    height_cm: f64,
    bmi: f64,
}

impl Measurement {
    /// # Errors
    ///
    /// Returns `BodyMetricError` for non-positive or non-finite values.
    pub fn new(weight_kg: f64, height_cm: f64) -> Result<Self, BodyMetricError> {
        let bmi = bmi(weight_kg, height_cm)?;
        Ok(Self {
            weight_kg,
            height_cm,
            bmi,
        })
    }

    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    #[must_use]
    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.bmi
    }
}

/// A weight/height reading owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMetric {
    id: BodyMetricId,
    user_id: UserId,
    recorded_at: DateTime<Utc>,
    measurement: Measurement,
}

impl BodyMetric {
    #[must_use]
    pub fn new(
        id: BodyMetricId,
        user_id: UserId,
        recorded_at: DateTime<Utc>,
        measurement: Measurement,
    ) -> Self {
        Self {
            id,
            user_id,
            recorded_at,
            measurement,
        }
    }

    /// Rehydrate from storage. BMI is recomputed rather than trusted.
    ///
    /// # Errors
    ///
    /// Returns `BodyMetricError` if the stored measurements are invalid.
    pub fn from_persisted(
        id: BodyMetricId,
        user_id: UserId,
        recorded_at: DateTime<Utc>,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<Self, BodyMetricError> {
        Ok(Self::new(
            id,
            user_id,
            recorded_at,
            Measurement::new(weight_kg, height_cm)?,
        ))
    }

    #[must_use]
    pub fn id(&self) -> BodyMetricId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        self.measurement.weight_kg
    }

    #[must_use]
    pub fn height_cm(&self) -> f64 {
        self.measurement.height_cm
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.measurement.bmi
    }

    /// Replace weight and height; BMI follows.
    ///
    /// # Errors
    ///
    /// Returns `BodyMetricError` and leaves the metric untouched on invalid input.
    pub fn update_measurements(
        &mut self,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<(), BodyMetricError> {
        self.measurement = Measurement::new(weight_kg, height_cm)?;
        Ok(())
    }

    pub fn set_recorded_at(&mut self, recorded_at: DateTime<Utc>) {
        self.recorded_at = recorded_at;
    }
}
