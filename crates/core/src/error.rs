//! Validation errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a request is refused before the pipeline starts.
///
/// A `ValidationError` never leaves ledger or profile side effects behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Employee identifier cannot be empty")]
    EmptyEmployee,

    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Approver cannot be empty")]
    EmptyApprover,

    #[error("Override justification cannot be empty")]
    EmptyJustification,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}
