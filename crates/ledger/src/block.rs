//! Ledger blocks and their payloads

use chrono::{DateTime, Utc};
use efrn_core::{Amount, Currency, EmployeeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Payload of the genesis block
pub const GENESIS_DATA: &str = "Genesis Block - EFRN PLR Initiated";

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Hash carried by the genesis block, `sha256("genesis")`
pub fn genesis_hash() -> String {
    hex::encode(Sha256::digest(b"genesis"))
}

/// Outcome recorded in a block. Distinguishes override clears permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeStatus {
    Rejected,
    Cleared,
    ClearedByOverride,
}

/// Transaction outcome summary persisted as a block payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// `TX-` followed by 8 uppercase hex characters
    pub transaction_id: String,
    pub employee: EmployeeId,
    pub amount: Amount,
    pub currency: Currency,
    pub status: OutcomeStatus,
    pub reason: String,
    /// Metadata per agent name (Compliance, Risk, Escrow, Settlement, Audit)
    #[serde(default)]
    pub agent_feedback: BTreeMap<String, Value>,
}

impl OutcomeRecord {
    pub fn new(
        employee: EmployeeId,
        amount: Amount,
        currency: Currency,
        status: OutcomeStatus,
        reason: impl Into<String>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            transaction_id: format!("TX-{}", id[..8].to_uppercase()),
            employee,
            amount,
            currency,
            status,
            reason: reason.into(),
            agent_feedback: BTreeMap::new(),
        }
    }

    /// Attach one agent's metadata
    pub fn feedback(mut self, agent: impl Into<String>, meta: Value) -> Self {
        self.agent_feedback.insert(agent.into(), meta);
        self
    }
}

/// Block payload: either the genesis sentinel or a transaction outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Outcome(OutcomeRecord),
    Sentinel(String),
}

/// One immutable, hash-linked record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBlock {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub data: BlockData,
    pub prev_hash: String,
    pub hash: String,
}

impl LedgerBlock {
    /// The distinguished block at index 0.
    ///
    /// Its hash is `sha256("genesis")` and is never recomputed from content.
    pub fn genesis(timestamp: DateTime<Utc>) -> Self {
        Self {
            index: 0,
            timestamp,
            data: BlockData::Sentinel(GENESIS_DATA.to_string()),
            prev_hash: GENESIS_PREV_HASH.to_string(),
            hash: genesis_hash(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.prev_hash == GENESIS_PREV_HASH
    }

    /// Every fixed field of the genesis block is intact
    pub fn is_intact_genesis(&self) -> bool {
        self.is_genesis()
            && self.hash == genesis_hash()
            && matches!(&self.data, BlockData::Sentinel(s) if s == GENESIS_DATA)
    }

    /// The outcome payload, or `None` for sentinel entries
    pub fn outcome(&self) -> Option<&OutcomeRecord> {
        match &self.data {
            BlockData::Outcome(record) => Some(record),
            BlockData::Sentinel(_) => None,
        }
    }
}
