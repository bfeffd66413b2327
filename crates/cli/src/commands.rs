//! CLI commands

use efrn_core::EmployeeId;
use efrn_ledger::{LedgerBlock, VerifyReport};
use efrn_orchestrator::{OrchestrationResult, OverrideInput, Scenario, TransactionInput};
use efrn_profile::EmployeeProfile;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::context::AppContext;

fn print_json<T: Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a transaction through the pipeline
pub async fn submit(
    ctx: &AppContext,
    employee: &str,
    amount: Decimal,
    currency: Option<String>,
    scenario: Option<&str>,
) -> Result<OrchestrationResult, anyhow::Error> {
    let scenario = scenario
        .map(|s| s.parse::<Scenario>())
        .transpose()
        .map_err(|_| anyhow::anyhow!("Unknown scenario (expected positive or negative)"))?;

    let result = ctx
        .orchestrator
        .submit_input(TransactionInput {
            employee: employee.to_string(),
            amount,
            currency,
            scenario,
        })
        .await?;

    print_json(&result)?;
    Ok(result)
}

/// Apply an administrative override
pub async fn override_transaction(
    ctx: &AppContext,
    employee: &str,
    approver: &str,
    justification: &str,
    amount: Option<Decimal>,
    currency: Option<String>,
) -> Result<OrchestrationResult, anyhow::Error> {
    let result = ctx
        .orchestrator
        .override_input(OverrideInput {
            employee: employee.to_string(),
            approver: approver.to_string(),
            justification: justification.to_string(),
            amount,
            currency,
        })
        .await?;

    print_json(&result)?;
    Ok(result)
}

/// Show the most recent ledger entries, newest first
pub fn recent(ctx: &AppContext, limit: usize) -> Result<Vec<LedgerBlock>, anyhow::Error> {
    let mut blocks = ctx.ledger.recent(limit)?;
    blocks.reverse();

    if blocks.is_empty() {
        println!("No transactions recorded");
    } else {
        print_json(&blocks)?;
    }
    Ok(blocks)
}

/// Verify the ledger hash chain
pub fn verify(ctx: &AppContext) -> Result<VerifyReport, anyhow::Error> {
    let report = ctx.ledger.verify()?;

    if report.valid {
        println!("✅ {} ({} blocks)", report.explanation, report.blocks);
    } else {
        println!("❌ {}", report.explanation);
    }
    Ok(report)
}

/// Show one employee's profile, or all profiles
pub fn profile(ctx: &AppContext, employee: Option<&str>) -> Result<Vec<EmployeeProfile>, anyhow::Error> {
    let profiles = match employee {
        Some(id) => {
            let id = EmployeeId::new(id)?;
            match ctx.profiles.get(&id)? {
                Some(p) => vec![p],
                None => {
                    println!(
                        "No profile for {} (default trust score {})",
                        id,
                        efrn_profile::ProfileStore::DEFAULT_TRUST_SCORE
                    );
                    return Ok(Vec::new());
                }
            }
        }
        None => ctx.profiles.list_all()?,
    };

    print_json(&profiles)?;
    Ok(profiles)
}
