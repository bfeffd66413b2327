//! Settlement contract types

use async_trait::async_trait;
use efrn_core::{Amount, Currency, EmployeeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};

use crate::ConnectorError;

/// What the orchestrator asks the rail to settle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub employee: EmployeeId,
    pub amount: Amount,
    pub currency: Currency,
}

impl SettlementRequest {
    pub fn new(employee: EmployeeId, amount: Amount, currency: Currency) -> Self {
        Self {
            employee,
            amount,
            currency,
        }
    }
}

/// Clearance state reported by the rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettlementStatus {
    Cleared,
    Pending,
}

/// One rail response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub status: SettlementStatus,
    /// External reference (e.g. `FTM-1718000000000`)
    pub reference: String,
    /// Rail-specific details, copied into the Settlement step metadata
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl SettlementResponse {
    pub fn new(status: SettlementStatus, reference: impl Into<String>) -> Self {
        Self {
            status,
            reference: reference.into(),
            meta: Map::new(),
        }
    }

    /// Attach a metadata field
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn is_cleared(&self) -> bool {
        self.status == SettlementStatus::Cleared
    }
}

/// External settlement rail
///
/// Implementations may return `Pending` any number of times; bounding the
/// retries is the caller's job.
#[async_trait]
pub trait SettlementConnector: Send + Sync {
    /// Post a transaction to the rail
    async fn post(&self, request: &SettlementRequest) -> Result<SettlementResponse, ConnectorError>;

    /// Connector name for logs
    fn name(&self) -> &str {
        "settlement"
    }
}
