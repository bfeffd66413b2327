//! Ledger errors

use thiserror::Error;

/// Storage failures of the ledger.
///
/// None of these are retried inside the store; a run whose append fails has
/// not been committed.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt ledger line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Ledger writer lock poisoned")]
    LockPoisoned,
}
