//! End-to-end pipeline runs against on-disk stores

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use efrn_core::{Amount, Currency, EmployeeId, FixedClock, ValidationError};
use efrn_ledger::{LedgerStore, OutcomeStatus};
use efrn_orchestrator::{
    AgentName, FinalStatus, FixedScorer, Orchestrator, OrchestratorConfig, OrchestratorError,
    OverrideInput, OverrideRequest, Scenario, TransactionInput, TransactionRequest,
};
use efrn_profile::ProfileStore;
use efrn_settlement::{ScriptedConnector, SettlementStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

struct Harness {
    orch: Orchestrator,
    ledger: Arc<LedgerStore>,
    profiles: Arc<ProfileStore>,
    rail: Arc<ScriptedConnector>,
    _dir: TempDir,
}

fn harness(score: u8, rail: ScriptedConnector) -> Harness {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()));
    let ledger = Arc::new(LedgerStore::with_clock(dir.path().join("plr.jsonl"), clock.clone()).unwrap());
    let profiles = Arc::new(ProfileStore::in_memory_with_clock(clock.clone()).unwrap());
    let rail = Arc::new(rail);

    let config = OrchestratorConfig {
        settlement_backoff_ms: 1,
        ..Default::default()
    };
    let orch = Orchestrator::new(
        ledger.clone(),
        profiles.clone(),
        rail.clone(),
        Arc::new(FixedScorer(score)),
    )
    .with_config(config)
    .with_clock(clock);

    Harness {
        orch,
        ledger,
        profiles,
        rail,
        _dir: dir,
    }
}

fn emp(id: &str) -> EmployeeId {
    EmployeeId::new(id).unwrap()
}

fn request(employee: &str, amount: Decimal) -> TransactionRequest {
    TransactionRequest::new(emp(employee), Amount::new(amount).unwrap(), Currency::Usd)
}

#[tokio::test]
async fn rejection_exits_after_risk() {
    let h = harness(31, ScriptedConnector::always(SettlementStatus::Cleared));

    let result = h
        .orch
        .submit(request("EMP001", dec!(15000)).with_scenario(Scenario::Negative))
        .await
        .unwrap();

    assert_eq!(result.final_status, FinalStatus::Rejected);
    assert_eq!(result.agents(), vec![AgentName::Compliance, AgentName::Risk]);
    assert_eq!(
        result.reason.as_deref(),
        Some("Risk agent flagged this transaction as too risky.")
    );
    assert_eq!(result.steps[1].status, "REJECTED: High risk (score=31)");
    assert_eq!(h.rail.calls(), 0);

    let recent = h.ledger.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    let outcome = recent[0].outcome().unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(outcome.agent_feedback.len(), 2);
    assert_eq!(outcome.agent_feedback["Risk"]["score"], 31);

    assert_eq!(result.trust_before, Some(50));
    assert_eq!(result.trust_after, Some(47));
    assert_eq!(h.profiles.trust_score(&emp("EMP001")).unwrap(), 47);
}

#[tokio::test]
async fn clear_path_runs_all_agents() {
    let h = harness(88, ScriptedConnector::always(SettlementStatus::Cleared));

    let result = h.orch.submit(request("EMP001", dec!(1200))).await.unwrap();

    assert_eq!(result.final_status, FinalStatus::Cleared);
    assert_eq!(
        result.agents(),
        vec![
            AgentName::Compliance,
            AgentName::Risk,
            AgentName::Escrow,
            AgentName::Settlement,
            AgentName::Audit
        ]
    );
    assert_eq!(h.rail.calls(), 1);

    let blocks = h.ledger.recent(10).unwrap();
    assert_eq!(blocks.len(), 1);
    let outcome = blocks[0].outcome().unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Cleared);
    for agent in ["Compliance", "Risk", "Escrow", "Settlement"] {
        assert!(outcome.agent_feedback.contains_key(agent), "missing {}", agent);
    }

    let audit = result.step(AgentName::Audit).unwrap();
    assert_eq!(audit.status, "Cleared and Recorded in PLR");
    assert_eq!(audit.meta["ledger_index_preview"], blocks[0].index);
    assert_eq!(result.ledger_index, Some(blocks[0].index));
    assert_eq!(result.transaction_id, outcome.transaction_id);

    assert_eq!(result.trust_after, Some(52));
}

#[tokio::test]
async fn pending_exhaustion_forces_clear() {
    let h = harness(75, ScriptedConnector::always(SettlementStatus::Pending));

    let result = h.orch.submit(request("EMP001", dec!(500))).await.unwrap();

    assert_eq!(h.rail.calls(), 5);
    assert_eq!(result.final_status, FinalStatus::Cleared);

    let settlement = result.step(AgentName::Settlement).unwrap();
    assert_eq!(settlement.status, "Cleared");
    assert_eq!(settlement.meta["forced_clear"], true);
    assert_eq!(settlement.meta["attempts"], 5);
}

#[tokio::test]
async fn pending_exhaustion_respects_configured_ceiling() {
    let dir = TempDir::new().unwrap();
    let rail = Arc::new(ScriptedConnector::always(SettlementStatus::Pending));
    let orch = Orchestrator::new(
        Arc::new(LedgerStore::new(dir.path().join("plr.jsonl")).unwrap()),
        Arc::new(ProfileStore::in_memory().unwrap()),
        rail.clone(),
        Arc::new(FixedScorer(90)),
    )
    .with_config(OrchestratorConfig {
        settlement_max_attempts: 2,
        settlement_backoff_ms: 0,
        ..Default::default()
    });

    let result = orch.submit(request("EMP001", dec!(10))).await.unwrap();
    assert_eq!(rail.calls(), 2);
    assert_eq!(result.final_status, FinalStatus::Cleared);
}

#[tokio::test]
async fn override_resolves_last_rejected_amount() {
    let h = harness(20, ScriptedConnector::always(SettlementStatus::Cleared));

    let mut rejected = request("EMP002", dec!(15000));
    rejected.currency = Currency::Inr;
    h.orch.submit(rejected).await.unwrap();

    let result = h
        .orch
        .override_transaction(
            OverrideRequest::new(emp("EMP002"), "RISK_OFFICER", "Known vendor payment").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(result.final_status, FinalStatus::ClearedByOverride);
    assert_eq!(result.amount.value(), dec!(15000));
    assert_eq!(result.currency, Currency::Inr);
    assert_eq!(result.reason.as_deref(), Some("Override applied by RISK_OFFICER"));

    let statuses: Vec<&str> = result.steps.iter().map(|s| s.status.as_str()).collect();
    assert_eq!(
        statuses,
        vec![
            "KYC Verified (carried)",
            "Overridden by RISK_OFFICER",
            "Held 300.00 (override)",
            "Cleared (override)",
            "Cleared and Recorded in PLR (override path)",
        ]
    );

    let blocks = h.ledger.recent(10).unwrap();
    assert_eq!(blocks.len(), 2);
    let outcome = blocks[1].outcome().unwrap();
    assert_eq!(outcome.status, OutcomeStatus::ClearedByOverride);
    assert_eq!(outcome.reason, "Overridden by RISK_OFFICER: Known vendor payment");
    assert_eq!(outcome.agent_feedback["Audit"]["approver"], "RISK_OFFICER");
    assert_eq!(outcome.agent_feedback["Audit"]["justification"], "Known vendor payment");
    assert_eq!(outcome.agent_feedback["Compliance"]["carried_from"], true);

    // -3 for the rejection, +1 for the override
    assert_eq!(result.trust_after, Some(48));
}

#[tokio::test]
async fn override_never_rejects() {
    // A scorer that would reject everything is never consulted
    let h = harness(0, ScriptedConnector::always(SettlementStatus::Pending));

    let result = h
        .orch
        .override_input(OverrideInput {
            employee: "EMP003".into(),
            approver: "CFO".into(),
            justification: "Board approved".into(),
            amount: Some(dec!(99999)),
            currency: None,
        })
        .await
        .unwrap();

    assert_eq!(result.final_status, FinalStatus::ClearedByOverride);
    assert_eq!(result.currency, Currency::Usd);
    assert_eq!(h.rail.calls(), 5);
    assert_eq!(result.step(AgentName::Settlement).unwrap().meta["forced_clear"], true);
}

#[tokio::test]
async fn override_without_amount_or_history_fails_cleanly() {
    let h = harness(90, ScriptedConnector::always(SettlementStatus::Cleared));

    let err = h
        .orch
        .override_transaction(OverrideRequest::new(emp("EMP009"), "RISK_OFFICER", "retry").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::UnresolvedAmount { .. }));
    assert!(!err.is_storage());
    assert_eq!(h.ledger.block_count().unwrap(), 0);
    assert!(h.profiles.get(&emp("EMP009")).unwrap().is_none());
    assert_eq!(h.rail.calls(), 0);
}

#[tokio::test]
async fn validation_failure_has_no_side_effects() {
    let h = harness(90, ScriptedConnector::always(SettlementStatus::Cleared));

    let err = h
        .orch
        .submit_input(TransactionInput {
            employee: "EMP001".into(),
            amount: dec!(-1),
            currency: None,
            scenario: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Validation(ValidationError::NegativeAmount(_))
    ));
    assert_eq!(h.ledger.block_count().unwrap(), 0);
    assert!(h.profiles.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn ledger_failure_is_not_a_terminal_status() {
    let dir = TempDir::new().unwrap();
    // A directory cannot be opened for append
    let ledger = Arc::new(LedgerStore::new(dir.path()).unwrap());
    let profiles = Arc::new(ProfileStore::in_memory().unwrap());
    let orch = Orchestrator::new(
        ledger,
        profiles.clone(),
        Arc::new(ScriptedConnector::always(SettlementStatus::Cleared)),
        Arc::new(FixedScorer(90)),
    );

    let err = orch.submit(request("EMP001", dec!(10))).await.unwrap_err();
    assert!(err.is_storage());
    assert!(profiles.get(&emp("EMP001")).unwrap().is_none());
}

#[tokio::test]
async fn trust_failure_after_commit_keeps_the_outcome() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("profiles.db");
    let ledger = Arc::new(LedgerStore::new(dir.path().join("plr.jsonl")).unwrap());
    let profiles = Arc::new(ProfileStore::new(&db).unwrap());

    // Every profile write now aborts inside SQLite
    let side = rusqlite::Connection::open(&db).unwrap();
    side.execute_batch(
        "CREATE TRIGGER refuse_profiles BEFORE INSERT ON employee_profiles
         BEGIN SELECT RAISE(ABORT, 'profile writes disabled'); END;",
    )
    .unwrap();

    let orch = Orchestrator::new(
        ledger.clone(),
        profiles.clone(),
        Arc::new(ScriptedConnector::always(SettlementStatus::Cleared)),
        Arc::new(FixedScorer(90)),
    );

    let result = orch.submit(request("EMP001", dec!(10))).await.unwrap();
    assert_eq!(result.final_status, FinalStatus::Cleared);
    assert_eq!(result.trust_before, Some(ProfileStore::DEFAULT_TRUST_SCORE));
    assert_eq!(result.trust_after, None);
    assert_eq!(result.ledger_index, Some(1));

    let recent = ledger.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].outcome().unwrap().transaction_id, result.transaction_id);
    assert!(profiles.get(&emp("EMP001")).unwrap().is_none());
}

#[tokio::test]
async fn concurrent_runs_keep_chain_intact() {
    let h = harness(90, ScriptedConnector::always(SettlementStatus::Cleared));
    let orch = Arc::new(h.orch);

    let mut handles = Vec::new();
    for i in 0..12 {
        let orch = Arc::clone(&orch);
        handles.push(tokio::spawn(async move {
            orch.submit(request(&format!("EMP{:03}", i % 3), dec!(100))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().final_status, FinalStatus::Cleared);
    }

    let blocks = h.ledger.read_all().unwrap();
    assert_eq!(blocks.len(), 13);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.index, i as u64);
    }
    assert!(h.ledger.verify().unwrap().is_valid());

    // 4 clears each at +2
    assert_eq!(h.profiles.trust_score(&emp("EMP000")).unwrap(), 58);
}
