//! Display rounding shared by BMI, nutrient totals and goal progress.
//!
//! Values leave the core already rounded, so callers never round again.

/// Rounds to two decimal places (half away from zero).
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamps a percentage into `[0, 100]` and then rounds it.
///
/// Non-finite input yields `0.0`.
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    round2(value.clamp(0.0, 100.0))
}
