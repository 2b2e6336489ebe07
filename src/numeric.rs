//! Discounting and rate/probability conversions shared by every event, plus float comparison
//! helpers built on the `approx` crate.
//!
//! All three conversions fail with [`HepceError::DomainError`] when called outside of their
//! domain. Events propagate these errors instead of masking them: a negative discount rate or a
//! probability of one reaching `probability_to_rate` is a configuration bug.

use approx::AbsDiffEq;

use crate::error::HepceError;

/// Targeted accuracy instantiated over `f64`
pub const ACC: f64 = 10e-11;

/// Converts a per-period probability into an equivalent constant rate, `-ln(1 - p)`.
///
/// # Errors
/// Returns a `DomainError` unless `0 <= probability < 1`.
pub fn probability_to_rate(probability: f64) -> Result<f64, HepceError> {
    if !(0.0..1.0).contains(&probability) {
        return Err(HepceError::DomainError(format!(
            "probability {probability} is outside of [0, 1)"
        )));
    }
    Ok(-(1.0 - probability).ln())
}

/// Converts a constant rate into the probability of at least one event in a period,
/// `1 - e^-rate`.
///
/// # Errors
/// Returns a `DomainError` if `rate` is negative.
pub fn rate_to_probability(rate: f64) -> Result<f64, HepceError> {
    if rate < 0.0 || rate.is_nan() {
        return Err(HepceError::DomainError(format!("rate {rate} is negative")));
    }
    Ok(1.0 - (-rate).exp())
}

/// Discounts `value` to present value at `timestep`, `value / (1 + rate)^timestep`. When
/// `annual` is set, `rate` is an annual rate and is divided by 12 first.
///
/// # Errors
/// Returns a `DomainError` if either `rate` or `timestep` is negative.
pub fn discount(value: f64, rate: f64, timestep: i32, annual: bool) -> Result<f64, HepceError> {
    if rate < 0.0 || timestep < 0 {
        return Err(HepceError::DomainError(format!(
            "cannot discount with rate {rate} at timestep {timestep}"
        )));
    }
    let rate = if annual { rate / 12.0 } else { rate };
    Ok(value / (1.0 + rate).powi(timestep))
}

/// Scales a probability through rate space: `rate_to_probability(probability_to_rate(p) * m)`.
///
/// # Errors
/// Propagates the domain errors of the two conversions.
pub fn scale_probability(probability: f64, multiplier: f64) -> Result<f64, HepceError> {
    rate_to_probability(probability_to_rate(probability)? * multiplier)
}

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}
