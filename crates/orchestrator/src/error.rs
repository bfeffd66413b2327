//! Orchestrator error types

use efrn_core::ValidationError;
use efrn_ledger::LedgerError;
use efrn_profile::ProfileError;
use thiserror::Error;

/// Reasons a run fails without a terminal status.
///
/// A REJECTED transaction is a successful run; these are not.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger storage failure: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Profile storage failure: {0}")]
    Profile(#[from] ProfileError),

    #[error("No amount given and no rejected transaction on record for {employee}")]
    UnresolvedAmount { employee: String },
}

impl OrchestratorError {
    /// Durable storage failed; the outcome may not be committed
    pub fn is_storage(&self) -> bool {
        matches!(self, OrchestratorError::Ledger(_) | OrchestratorError::Profile(_))
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
