//! Connector error types

use thiserror::Error;

/// Failures talking to the settlement rail.
///
/// The orchestrator treats these like a pending response and retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("Settlement rail unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed settlement response: {0}")]
    Malformed(String),
}
