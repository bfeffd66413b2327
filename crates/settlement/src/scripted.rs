//! Deterministic connector for tests
//!
//! Plays back a fixed script of outcomes and counts invocations. When the
//! script runs out, the last step repeats.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ConnectorError;
use crate::types::{SettlementConnector, SettlementRequest, SettlementResponse, SettlementStatus};

/// One scripted rail outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Respond(SettlementStatus),
    Fail(ConnectorError),
}

impl From<SettlementStatus> for ScriptStep {
    fn from(status: SettlementStatus) -> Self {
        ScriptStep::Respond(status)
    }
}

/// Connector that replays a script
pub struct ScriptedConnector {
    script: Vec<ScriptStep>,
    calls: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always respond with `status`
    pub fn always(status: SettlementStatus) -> Self {
        Self::new(vec![status.into()])
    }

    /// Respond with each status in turn
    pub fn sequence(statuses: impl IntoIterator<Item = SettlementStatus>) -> Self {
        Self::new(statuses.into_iter().map(ScriptStep::from).collect())
    }

    /// Number of `post` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettlementConnector for ScriptedConnector {
    async fn post(&self, _request: &SettlementRequest) -> Result<SettlementResponse, ConnectorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self
            .script
            .get(n)
            .or_else(|| self.script.last())
            .ok_or_else(|| ConnectorError::Unreachable("empty script".to_string()))?;

        match step {
            ScriptStep::Respond(status) => Ok(SettlementResponse::new(*status, format!("FTM-SCRIPT-{}", n + 1))
                .with_meta("attempt", (n + 1) as u64)),
            ScriptStep::Fail(err) => Err(err.clone()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
