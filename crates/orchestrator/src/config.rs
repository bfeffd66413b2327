//! Orchestrator configuration
//!
//! Thresholds, deltas and retry policy are loaded from a JSON file; any
//! field left out takes its default.

use efrn_core::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    // === Risk ===
    /// Scores below this are rejected
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: u8,

    /// Amounts above this are scored in the low band
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: Decimal,

    /// Reported on every Risk step
    #[serde(default = "default_model_version")]
    pub model_version: String,

    // === Escrow ===
    /// Fraction of the amount held in escrow
    #[serde(default = "default_escrow_rate")]
    pub escrow_rate: Decimal,

    // === Settlement ===
    /// Total connector invocations before the forced clear
    #[serde(default = "default_settlement_max_attempts")]
    pub settlement_max_attempts: u32,

    /// Wait between connector invocations
    #[serde(default = "default_settlement_backoff_ms")]
    pub settlement_backoff_ms: u64,

    // === Trust ===
    #[serde(default = "default_reject_delta")]
    pub reject_delta: i32,

    #[serde(default = "default_clear_delta")]
    pub clear_delta: i32,

    #[serde(default = "default_override_delta")]
    pub override_delta: i32,

    /// Used when a request carries no currency
    #[serde(default)]
    pub default_currency: Currency,
}

fn default_risk_threshold() -> u8 {
    50
}

fn default_high_value_threshold() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_model_version() -> String {
    "risk-v2.1".to_string()
}

fn default_escrow_rate() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_settlement_max_attempts() -> u32 {
    5
}

fn default_settlement_backoff_ms() -> u64 {
    300
}

fn default_reject_delta() -> i32 {
    -3
}

fn default_clear_delta() -> i32 {
    2
}

fn default_override_delta() -> i32 {
    1
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            risk_threshold: default_risk_threshold(),
            high_value_threshold: default_high_value_threshold(),
            model_version: default_model_version(),
            escrow_rate: default_escrow_rate(),
            settlement_max_attempts: default_settlement_max_attempts(),
            settlement_backoff_ms: default_settlement_backoff_ms(),
            reject_delta: default_reject_delta(),
            clear_delta: default_clear_delta(),
            override_delta: default_override_delta(),
            default_currency: Currency::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Get settlement backoff as Duration
    pub fn settlement_backoff(&self) -> Duration {
        Duration::from_millis(self.settlement_backoff_ms)
    }

    /// Connector invocations per run, never less than one
    pub fn settlement_attempts(&self) -> u32 {
        self.settlement_max_attempts.max(1)
    }
}
