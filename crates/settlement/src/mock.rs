//! Mock settlement rail
//!
//! Clears roughly three of every four posts and reports the rest as pending,
//! like a slow real rail under load.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;

use crate::error::ConnectorError;
use crate::types::{SettlementConnector, SettlementRequest, SettlementResponse, SettlementStatus};

/// Random settlement rail for demos and manual runs
pub struct MockConnector {
    clear_probability: f64,
    latency: Duration,
}

impl MockConnector {
    /// Default mock: 75% cleared, 50 ms simulated latency
    pub fn new() -> Self {
        Self {
            clear_probability: 0.75,
            latency: Duration::from_millis(50),
        }
    }

    /// Change the probability that a post clears (clamped to `[0, 1]`)
    pub fn with_clear_probability(mut self, p: f64) -> Self {
        self.clear_probability = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self
    }

    /// Change the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementConnector for MockConnector {
    async fn post(&self, _request: &SettlementRequest) -> Result<SettlementResponse, ConnectorError> {
        let cleared = rand::thread_rng().gen_bool(self.clear_probability);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let status = if cleared {
            SettlementStatus::Cleared
        } else {
            SettlementStatus::Pending
        };

        Ok(
            SettlementResponse::new(status, format!("FTM-{}", Utc::now().timestamp_millis()))
                .with_meta("settlement_latency_ms", self.latency.as_millis() as u64),
        )
    }

    fn name(&self) -> &str {
        "mock"
    }
}
