//! Amount - Non-negative decimal wrapper for transaction amounts
//!
//! Negative amounts are refused at construction, so every `Amount` that
//! reaches the orchestrator is already valid.

use crate::error::ValidationError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative decimal amount.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use efrn_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(1200, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(1200, 0));
///
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO {
            Err(ValidationError::NegativeAmount(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a non-negative rate and round to `dp` decimal places.
    ///
    /// Ties round to even, so `0.125` at 2 places becomes `0.12`.
    pub fn scaled(&self, rate: Decimal, dp: u32) -> Amount {
        let raw = self.0 * rate.max(Decimal::ZERO);
        Amount(raw.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_zero() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(dec!(-100));
        assert!(matches!(result, Err(ValidationError::NegativeAmount(_))));
    }

    #[test]
    fn test_scaled_rounds_to_precision() {
        let amount = Amount::new(dec!(1234.56)).unwrap();
        assert_eq!(amount.scaled(dec!(0.02), 2).value(), dec!(24.69));
        assert_eq!(amount.scaled(dec!(0.02), 0).value(), dec!(25));
    }

    #[test]
    fn test_scaled_ties_to_even() {
        let amount = Amount::new(dec!(6.25)).unwrap();
        assert_eq!(amount.scaled(dec!(0.02), 2).value(), dec!(0.12));
    }

    #[test]
    fn test_negative_json_rejected() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-5\"");
        assert!(parsed.is_err());
    }
}
