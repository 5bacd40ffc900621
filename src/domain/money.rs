use std::fmt;

use serde::{Deserialize, Serialize};

/// Rate used when none has ever been configured.
pub const DEFAULT_RATE: f64 = 20.0;

/// Cost of a single delivered unit. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(f64);

impl Rate {
    pub fn new(value: f64) -> Result<Self, RateError> {
        if !value.is_finite() {
            return Err(RateError::NotFinite);
        }
        if value <= 0.0 {
            return Err(RateError::NonPositive(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Unrounded cost of `quantity` units at this rate.
    pub fn cost_of(&self, quantity: i64) -> f64 {
        quantity as f64 * self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_amount(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("rate must be greater than zero, got {0}")]
    NonPositive(f64),
    #[error("rate must be a finite number")]
    NotFinite,
}

/// Format an amount with two decimals for display.
/// Example: 60.0 -> "60.00", 12.345 -> "12.35"
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        assert_eq!(Rate::default().value(), 20.0);
    }

    #[test]
    fn test_rate_rejects_non_positive() {
        assert_eq!(Rate::new(0.0), Err(RateError::NonPositive(0.0)));
        assert_eq!(Rate::new(-1.5), Err(RateError::NonPositive(-1.5)));
        assert_eq!(Rate::new(f64::NAN), Err(RateError::NotFinite));
        assert_eq!(Rate::new(f64::INFINITY), Err(RateError::NotFinite));
        assert!(Rate::new(0.01).is_ok());
    }

    #[test]
    fn test_cost_of() {
        let rate = Rate::new(25.5).unwrap();
        assert_eq!(rate.cost_of(0), 0.0);
        assert_eq!(rate.cost_of(4), 102.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(60.0), "60.00");
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_amount(25.5), "25.50");
        assert_eq!(format_amount(0.0), "0.00");
    }
}
