//! Application context - wires stores, rail and scorer into an orchestrator

use efrn_ledger::LedgerStore;
use efrn_orchestrator::{BandScorer, Orchestrator, OrchestratorConfig, RiskScorer};
use efrn_profile::ProfileStore;
use efrn_settlement::{MockConnector, SettlementConnector};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const LEDGER_FILE: &str = "plr.jsonl";
const PROFILE_DB: &str = "profiles.db";

pub struct AppContext {
    pub orchestrator: Orchestrator,
    pub ledger: Arc<LedgerStore>,
    pub profiles: Arc<ProfileStore>,
}

impl AppContext {
    /// Context with the mock settlement rail and the band scorer
    pub fn new(data_path: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let config = match config_path {
            Some(path) => OrchestratorConfig::from_file(path)?,
            None => OrchestratorConfig::default(),
        };
        let scorer = Arc::new(BandScorer::from_config(&config));
        Self::with_components(data_path, config, Arc::new(MockConnector::new()), scorer)
    }

    /// Context with explicit rail and scorer
    pub fn with_components(
        data_path: impl AsRef<Path>,
        config: OrchestratorConfig,
        connector: Arc<dyn SettlementConnector>,
        scorer: Arc<dyn RiskScorer>,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let ledger = Arc::new(LedgerStore::new(data_path.join(LEDGER_FILE))?);
        let profiles = Arc::new(ProfileStore::new(data_path.join(PROFILE_DB))?);

        debug!(
            data = %data_path.display(),
            connector = connector.name(),
            "Opened EFRN stores"
        );

        let orchestrator = Orchestrator::new(ledger.clone(), profiles.clone(), connector, scorer)
            .with_config(config);

        Ok(Self {
            orchestrator,
            ledger,
            profiles,
        })
    }

    pub fn ledger_path(&self) -> &Path {
        self.ledger.path()
    }
}
