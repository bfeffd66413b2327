//! Employee profile record

use chrono::{DateTime, Utc};
use efrn_core::EmployeeId;
use serde::{Deserialize, Serialize};

pub const MIN_TRUST_SCORE: u8 = 0;
pub const MAX_TRUST_SCORE: u8 = 100;

/// Reputation record for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub employee: EmployeeId,
    /// Stable identifier, `REP-` followed by 8 uppercase hex characters
    pub reputation_id: String,
    pub trust_score: u8,
    pub last_active: DateTime<Utc>,
}

impl EmployeeProfile {
    /// Fresh profile with the given starting score
    pub fn new(employee: EmployeeId, trust_score: u8, now: DateTime<Utc>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            employee,
            reputation_id: format!("REP-{}", id[..8].to_uppercase()),
            trust_score: trust_score.min(MAX_TRUST_SCORE),
            last_active: now,
        }
    }
}

/// Add a signed delta to a score, clamping to `[0, 100]`
pub fn apply_delta(score: u8, delta: i32) -> u8 {
    let next = i64::from(score) + i64::from(delta);
    next.clamp(i64::from(MIN_TRUST_SCORE), i64::from(MAX_TRUST_SCORE)) as u8
}
