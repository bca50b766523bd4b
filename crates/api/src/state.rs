use std::sync::Arc;

use somnus_core::ingest::IngestionService;
use somnus_core::ledger::AlertLedger;
use somnus_core::locks::PatientLocks;
use somnus_db::PgStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: somnus_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Transmission processing.
    pub ingestion: Arc<IngestionService<PgStore>>,
}

impl AppState {
    pub fn new(pool: somnus_db::DbPool, config: ServerConfig) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        let ingestion = IngestionService::new(store, Arc::new(PatientLocks::new()));
        Self {
            pool,
            config: Arc::new(config),
            ingestion: Arc::new(ingestion),
        }
    }

    /// Alert ledger sharing the ingestion service's patient locks.
    pub fn ledger(&self) -> &AlertLedger<PgStore> {
        self.ingestion.ledger()
    }
}
