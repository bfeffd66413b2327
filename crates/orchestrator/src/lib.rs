//! EFRN Orchestrator - Explainable transaction pipeline
//!
//! Runs each request through the agent stages in fixed order:
//!
//! ```text
//! TransactionRequest
//!        │
//!        ▼
//!   Compliance ──► Risk ──(score < threshold)──► REJECTED (ledger + trust -3)
//!                   │
//!                   ▼
//!                Escrow ──► Settlement (bounded retry) ──► Audit
//!                                                           │
//!                                                           ▼
//!                                          CLEARED (ledger + trust +2)
//! ```
//!
//! The override handler re-enters the same stages with the risk branch
//! bypassed and always ends in `CLEARED_BY_OVERRIDE`.

pub mod config;
pub mod engine;
pub mod error;
pub mod escrow;
pub mod request;
pub mod risk;
pub mod step;

pub use config::OrchestratorConfig;
pub use engine::Orchestrator;
pub use error::OrchestratorError;
pub use escrow::hold_amount;
pub use request::{OverrideInput, OverrideRequest, Scenario, TransactionInput, TransactionRequest};
pub use risk::{BandScorer, FixedScorer, RiskAssessment, RiskScorer};
pub use step::{AgentName, FinalStatus, OrchestrationResult, StepRecord};
