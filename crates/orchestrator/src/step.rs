//! Step records and run results

use chrono::{DateTime, Utc};
use efrn_core::{Amount, Currency, EmployeeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
pub enum AgentName {
    Compliance,
    Risk,
    Escrow,
    Settlement,
    Audit,
}

/// What one agent did during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub agent: AgentName,
    /// Human-readable, e.g. `Score=72` or `Held 24.00`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl StepRecord {
    pub fn new(agent: AgentName, status: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            agent,
            status: status.into(),
            timestamp,
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Metadata as a JSON object, for ledger feedback
    pub fn meta_value(&self) -> Value {
        Value::Object(self.meta.clone())
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Cleared,
    Rejected,
    ClearedByOverride,
}

/// Full explanation of one run, returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub timestamp: DateTime<Utc>,
    pub transaction_id: String,
    pub employee: EmployeeId,
    pub amount: Amount,
    pub currency: Currency,
    pub steps: Vec<StepRecord>,
    pub final_status: FinalStatus,
    pub reason: Option<String>,
    pub trust_before: Option<u8>,
    pub trust_after: Option<u8>,
    /// Position of the ledger block that recorded this run
    pub ledger_index: Option<u64>,
}

impl OrchestrationResult {
    /// Agents in step order
    pub fn agents(&self) -> Vec<AgentName> {
        self.steps.iter().map(|s| s.agent).collect()
    }

    pub fn step(&self, agent: AgentName) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.agent == agent)
    }
}
