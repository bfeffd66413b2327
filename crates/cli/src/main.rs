//! EFRN CLI - Main entry point

use clap::{Parser, Subcommand};
use efrn_cli::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "efrn")]
#[command(about = "EFRN - Explainable employee transaction orchestration", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Orchestrator config (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a transaction through the agent pipeline
    Submit {
        /// Employee ID
        employee: String,
        /// Transaction amount
        amount: Decimal,
        /// Currency code (defaults to the configured currency)
        #[arg(long)]
        currency: Option<String>,
        /// Force an outcome branch: positive or negative
        #[arg(long)]
        scenario: Option<String>,
    },

    /// Clear a transaction under administrative override
    Override {
        /// Employee ID
        employee: String,
        /// Approving officer
        #[arg(long, default_value = "RISK_OFFICER")]
        approver: String,
        /// Reason for the override
        #[arg(long)]
        justification: String,
        /// Amount (defaults to the employee's last rejected amount)
        #[arg(long)]
        amount: Option<Decimal>,
        /// Currency code
        #[arg(long)]
        currency: Option<String>,
    },

    /// Show recent ledger entries
    Recent {
        /// Maximum number of entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Verify the ledger hash chain
    Verify,

    /// Show trust profiles
    Profile {
        /// Employee ID (all profiles if omitted)
        employee: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli.data, cli.config.as_deref())?;

    match cli.command {
        Commands::Submit {
            employee,
            amount,
            currency,
            scenario,
        } => {
            commands::submit(&ctx, &employee, amount, currency, scenario.as_deref()).await?;
        }

        Commands::Override {
            employee,
            approver,
            justification,
            amount,
            currency,
        } => {
            commands::override_transaction(&ctx, &employee, &approver, &justification, amount, currency)
                .await?;
        }

        Commands::Recent { limit } => {
            commands::recent(&ctx, limit)?;
        }

        Commands::Verify => {
            let report = commands::verify(&ctx)?;
            if !report.valid {
                std::process::exit(1);
            }
        }

        Commands::Profile { employee } => {
            commands::profile(&ctx, employee.as_deref())?;
        }
    }

    Ok(())
}
