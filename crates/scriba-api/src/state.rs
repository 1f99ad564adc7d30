//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use scriba_engine::{EnginePool, ProcessEngineFactory};
use scriba_store::TranscriptStore;
use scriba_worker::{Orchestrator, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Create new application state.
    ///
    /// Opens the database, builds the engine pool and sweeps projects
    /// orphaned by a previous run.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = TranscriptStore::open(&config.db_path)
            .with_context(|| format!("opening transcript store at {}", config.db_path.display()))?;

        let factory = Arc::new(ProcessEngineFactory::from_env());
        let pool = Arc::new(EnginePool::new(factory));

        let orchestrator = Orchestrator::new(WorkerConfig::from_env(), store, pool)?;
        let recovered = orchestrator.recover_orphans()?;
        if recovered > 0 {
            info!(count = recovered, "recovered orphaned jobs at startup");
        }

        Ok(Self {
            config,
            orchestrator,
        })
    }
}
