//! Escrow hold computation

use efrn_core::{Amount, Currency};
use rust_decimal::Decimal;

/// Amount held in escrow: `amount * rate`, rounded to the currency's
/// minor-unit precision.
pub fn hold_amount(amount: Amount, rate: Decimal, currency: &Currency) -> Amount {
    amount.scaled(rate, currency.minor_units())
}
