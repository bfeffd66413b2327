//! Orchestration engine
//!
//! Owns no persistent state. Each run builds its step list locally, commits
//! the outcome to the ledger, and only then adjusts the trust score.

use std::sync::Arc;

use efrn_core::{Amount, Clock, Currency, EmployeeId, SystemClock};
use efrn_ledger::{LedgerStore, OutcomeRecord, OutcomeStatus};
use efrn_profile::ProfileStore;
use efrn_settlement::{ConnectorError, SettlementConnector, SettlementRequest, SettlementResponse};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::escrow::hold_amount;
use crate::request::{OverrideInput, OverrideRequest, TransactionInput, TransactionRequest};
use crate::risk::{RiskAssessment, RiskScorer};
use crate::step::{AgentName, FinalStatus, OrchestrationResult, StepRecord};

const REJECTED_REASON: &str = "Risk agent flagged this transaction as too risky.";
const CLEARED_REASON: &str = "Transaction validated successfully across all agents.";

/// Transaction pipeline over shared ledger and profile stores
///
/// `Send + Sync`; many runs may share one orchestrator behind an `Arc`.
pub struct Orchestrator {
    ledger: Arc<LedgerStore>,
    profiles: Arc<ProfileStore>,
    connector: Arc<dyn SettlementConnector>,
    scorer: Arc<dyn RiskScorer>,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with default config and the system clock
    pub fn new(
        ledger: Arc<LedgerStore>,
        profiles: Arc<ProfileStore>,
        connector: Arc<dyn SettlementConnector>,
        scorer: Arc<dyn RiskScorer>,
    ) -> Self {
        Self {
            ledger,
            profiles,
            connector,
            scorer,
            clock: Arc::new(SystemClock),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validate a raw submission and run it
    pub async fn submit_input(&self, input: TransactionInput) -> OrchestratorResult<OrchestrationResult> {
        let request = input.validate(&self.config.default_currency)?;
        self.submit(request).await
    }

    /// Validate a raw override and apply it
    pub async fn override_input(&self, input: OverrideInput) -> OrchestratorResult<OrchestrationResult> {
        let request = input.validate()?;
        self.override_transaction(request).await
    }

    /// Run a request through Compliance, Risk, Escrow, Settlement and Audit.
    ///
    /// Ends in `REJECTED` after the Risk step when the score is below the
    /// threshold, otherwise in `CLEARED`. Storage failures are returned as
    /// errors, never as a terminal status.
    pub async fn submit(&self, request: TransactionRequest) -> OrchestratorResult<OrchestrationResult> {
        let started = self.clock.now();
        let TransactionRequest {
            employee,
            amount,
            currency,
            ..
        } = request.clone();
        let trust_before = self.profiles.trust_score(&employee)?;

        debug!(employee = %employee, amount = %amount, currency = %currency, "Starting orchestration");

        let mut steps = Vec::with_capacity(5);

        // Compliance
        let compliance = StepRecord::new(AgentName::Compliance, "KYC Verified", self.clock.now())
            .with_meta(object(json!({
                "confidence": 0.97,
                "notes": "Identity verified",
            })));
        steps.push(compliance);

        // Risk
        let threshold = self.config.risk_threshold;
        let assessment = RiskAssessment::new(
            self.scorer.score(&request),
            threshold,
            self.config.model_version.clone(),
        );
        let rejected = assessment.is_rejected(threshold);
        let risk_status = if rejected {
            format!("REJECTED: High risk (score={})", assessment.score)
        } else {
            format!("Score={}", assessment.score)
        };
        let risk = StepRecord::new(AgentName::Risk, risk_status, self.clock.now()).with_meta(object(json!({
            "score": assessment.score,
            "reasons": assessment.reasons,
            "model_version": assessment.model_version,
        })));
        steps.push(risk);
        debug!(employee = %employee, score = assessment.score, threshold, "Risk assessed");

        if rejected {
            let record = outcome(&employee, amount, &currency, OutcomeStatus::Rejected, REJECTED_REASON, &steps);
            let transaction_id = record.transaction_id.clone();
            let block = self.ledger.append(record)?;
            let trust_after = self.adjust_committed(&employee, self.config.reject_delta, &transaction_id, block.index);

            info!(
                employee = %employee,
                transaction_id = %transaction_id,
                score = assessment.score,
                ledger_index = block.index,
                "Transaction rejected"
            );

            return Ok(OrchestrationResult {
                timestamp: started,
                transaction_id,
                employee,
                amount,
                currency,
                steps,
                final_status: FinalStatus::Rejected,
                reason: Some(REJECTED_REASON.to_string()),
                trust_before: Some(trust_before),
                trust_after,
                ledger_index: Some(block.index),
            });
        }

        // Escrow
        let held = hold_amount(amount, self.config.escrow_rate, &currency);
        steps.push(
            StepRecord::new(AgentName::Escrow, format!("Held {}", held), self.clock.now())
                .with_meta(object(json!({ "held_amount": held }))),
        );

        // Settlement
        let settlement_meta = self
            .settle(&SettlementRequest::new(employee.clone(), amount, currency.clone()))
            .await;
        steps.push(
            StepRecord::new(AgentName::Settlement, "Cleared", self.clock.now()).with_meta(settlement_meta),
        );

        // Ledger append, then Audit with the committed position
        let record = outcome(&employee, amount, &currency, OutcomeStatus::Cleared, CLEARED_REASON, &steps);
        let transaction_id = record.transaction_id.clone();
        let block = self.ledger.append(record)?;

        steps.push(
            StepRecord::new(AgentName::Audit, "Cleared and Recorded in PLR", self.clock.now())
                .with_meta(object(json!({ "ledger_index_preview": block.index }))),
        );

        let trust_after = self.adjust_committed(&employee, self.config.clear_delta, &transaction_id, block.index);

        info!(
            employee = %employee,
            transaction_id = %transaction_id,
            ledger_index = block.index,
            trust_after = ?trust_after,
            "Transaction cleared"
        );

        Ok(OrchestrationResult {
            timestamp: started,
            transaction_id,
            employee,
            amount,
            currency,
            steps,
            final_status: FinalStatus::Cleared,
            reason: None,
            trust_before: Some(trust_before),
            trust_after,
            ledger_index: Some(block.index),
        })
    }

    /// Force a transaction through under administrative authority.
    ///
    /// Compliance is carried forward and Risk is never re-scored. Escrow and
    /// Settlement run as usual. The run always ends in `CLEARED_BY_OVERRIDE`.
    ///
    /// Without an explicit amount, the employee's most recent rejected
    /// transaction supplies amount and currency; if there is none the call
    /// fails with `UnresolvedAmount` and nothing is written.
    pub async fn override_transaction(&self, request: OverrideRequest) -> OrchestratorResult<OrchestrationResult> {
        let started = self.clock.now();
        let (amount, currency) = self.resolve_override(&request)?;
        let OverrideRequest {
            employee,
            approver,
            justification,
            ..
        } = request;
        let trust_before = self.profiles.trust_score(&employee)?;

        warn!(employee = %employee, approver = %approver, amount = %amount, "Applying manual override");

        let mut steps = Vec::with_capacity(5);

        steps.push(
            StepRecord::new(AgentName::Compliance, "KYC Verified (carried)", self.clock.now())
                .with_meta(object(json!({ "carried": true }))),
        );

        let authority = json!({
            "override": true,
            "approver": approver,
            "justification": justification,
        });
        steps.push(
            StepRecord::new(AgentName::Risk, format!("Overridden by {}", approver), self.clock.now())
                .with_meta(object(authority.clone())),
        );

        let held = hold_amount(amount, self.config.escrow_rate, &currency);
        steps.push(
            StepRecord::new(AgentName::Escrow, format!("Held {} (override)", held), self.clock.now())
                .with_meta(object(json!({ "held_amount": held, "override": true }))),
        );

        let mut settlement_meta = self
            .settle(&SettlementRequest::new(employee.clone(), amount, currency.clone()))
            .await;
        settlement_meta.insert("override".to_string(), Value::Bool(true));
        steps.push(
            StepRecord::new(AgentName::Settlement, "Cleared (override)", self.clock.now())
                .with_meta(settlement_meta),
        );

        let ledger_reason = format!("Overridden by {}: {}", approver, justification);
        let record = outcome(
            &employee,
            amount,
            &currency,
            OutcomeStatus::ClearedByOverride,
            ledger_reason,
            &steps,
        )
        .feedback(AgentName::Compliance.to_string(), json!({ "carried_from": true }))
        .feedback(AgentName::Audit.to_string(), authority.clone());
        let transaction_id = record.transaction_id.clone();
        let block = self.ledger.append(record)?;

        let mut audit_meta = object(authority);
        audit_meta.insert("ledger_index_preview".to_string(), Value::from(block.index));
        steps.push(
            StepRecord::new(
                AgentName::Audit,
                "Cleared and Recorded in PLR (override path)",
                self.clock.now(),
            )
            .with_meta(audit_meta),
        );

        let trust_after = self.adjust_committed(&employee, self.config.override_delta, &transaction_id, block.index);

        info!(
            employee = %employee,
            approver = %approver,
            transaction_id = %transaction_id,
            ledger_index = block.index,
            "Override recorded"
        );

        Ok(OrchestrationResult {
            timestamp: started,
            transaction_id,
            employee,
            amount,
            currency,
            steps,
            final_status: FinalStatus::ClearedByOverride,
            reason: Some(format!("Override applied by {}", approver)),
            trust_before: Some(trust_before),
            trust_after,
            ledger_index: Some(block.index),
        })
    }

    fn resolve_override(&self, request: &OverrideRequest) -> OrchestratorResult<(Amount, Currency)> {
        if let Some(amount) = request.amount {
            let currency = request
                .currency
                .clone()
                .unwrap_or_else(|| self.config.default_currency.clone());
            return Ok((amount, currency));
        }

        let last = self
            .ledger
            .last_rejected(&request.employee)?
            .ok_or_else(|| OrchestratorError::UnresolvedAmount {
                employee: request.employee.to_string(),
            })?;

        debug!(employee = %request.employee, amount = %last.amount, "Resolved override amount from last rejection");
        Ok((last.amount, request.currency.clone().unwrap_or(last.currency)))
    }

    /// Apply the trust delta for an outcome already in the ledger.
    ///
    /// The block cannot be withdrawn, so a profile failure here is logged
    /// against the committed transaction and reported as `trust_after: None`.
    fn adjust_committed(&self, employee: &EmployeeId, delta: i32, transaction_id: &str, ledger_index: u64) -> Option<u8> {
        match self.profiles.adjust(employee, delta) {
            Ok(profile) => Some(profile.trust_score),
            Err(e) => {
                warn!(
                    employee = %employee,
                    transaction_id = %transaction_id,
                    ledger_index,
                    delta,
                    error = %e,
                    "Trust update failed after ledger commit"
                );
                None
            }
        }
    }

    /// Post to the rail until it clears or the attempt budget is spent.
    ///
    /// Connector errors count as pending. When the budget runs out the
    /// outcome is forced to cleared and flagged with `forced_clear`.
    async fn settle(&self, request: &SettlementRequest) -> Map<String, Value> {
        let max_attempts = self.config.settlement_attempts();
        let mut attempts = 0u32;
        let mut last_pending: Option<SettlementResponse> = None;
        let mut last_error: Option<ConnectorError> = None;

        loop {
            attempts += 1;
            match self.connector.post(request).await {
                Ok(response) if response.is_cleared() => {
                    debug!(employee = %request.employee, attempts, reference = %response.reference, "Settlement cleared");
                    return settlement_meta(Some(response), attempts, false, None);
                }
                Ok(response) => {
                    debug!(employee = %request.employee, attempt = attempts, "Settlement pending");
                    last_pending = Some(response);
                }
                Err(e) => {
                    warn!(
                        connector = self.connector.name(),
                        employee = %request.employee,
                        attempt = attempts,
                        error = %e,
                        "Settlement connector error"
                    );
                    last_error = Some(e);
                }
            }

            if attempts >= max_attempts {
                break;
            }
            tokio::time::sleep(self.config.settlement_backoff()).await;
        }

        warn!(
            connector = self.connector.name(),
            employee = %request.employee,
            attempts,
            "Settlement still pending after retry budget; forcing clear"
        );
        settlement_meta(last_pending, attempts, true, last_error)
    }
}

fn settlement_meta(
    response: Option<SettlementResponse>,
    attempts: u32,
    forced: bool,
    error: Option<ConnectorError>,
) -> Map<String, Value> {
    let mut meta = Map::new();
    if let Some(response) = response {
        meta = response.meta;
        meta.insert("reference".to_string(), Value::String(response.reference));
    }
    if let Some(e) = error {
        meta.insert("last_error".to_string(), Value::String(e.to_string()));
    }
    meta.insert("attempts".to_string(), Value::from(attempts));
    meta.insert("forced_clear".to_string(), Value::Bool(forced));
    meta
}

/// Ledger payload carrying every step's metadata so far
fn outcome(
    employee: &EmployeeId,
    amount: Amount,
    currency: &Currency,
    status: OutcomeStatus,
    reason: impl Into<String>,
    steps: &[StepRecord],
) -> OutcomeRecord {
    steps.iter().fold(
        OutcomeRecord::new(employee.clone(), amount, currency.clone(), status, reason),
        |record, step| record.feedback(step.agent.to_string(), step.meta_value()),
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
