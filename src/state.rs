//! Application state shared by every handler.
//!
//! Owns the challenge service (and through it the store handle). Built once
//! by the composition root from `AppConfig`.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::error::StoreResult;
use crate::service::ChallengeService;
use crate::store::{ChallengeStore, MemoryStore, SqliteStore};

#[derive(Clone)]
pub struct AppState {
    pub challenges: ChallengeService,
}

impl AppState {
    pub fn new(store: Arc<dyn ChallengeStore>) -> Self {
        Self { challenges: ChallengeService::new(store) }
    }

    /// Pick the store from config: SQLite when a database path is set, memory otherwise.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &AppConfig) -> StoreResult<Self> {
        let store: Arc<dyn ChallengeStore> = match &cfg.database_path {
            Some(path) => {
                info!(target: "challenge_picker", path = %path.display(), "Using SQLite challenge store");
                Arc::new(SqliteStore::open(path)?)
            }
            None => {
                info!(target: "challenge_picker", "Using in-memory challenge store (data is lost on restart)");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(store))
    }

    /// State over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
