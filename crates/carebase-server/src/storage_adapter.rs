//! Builds the record store selected by configuration.

use std::sync::Arc;

use carebase_db_memory::InMemoryStore;
use carebase_db_postgres::{DynPostgresStore, PostgresStore};
use carebase_storage::{DynRecordStore, StorageError, TimeoutStore};

use crate::config::{AppConfig, StorageBackend};

/// The store handed to the service plus whatever needs explicit teardown.
pub struct StoreHandle {
    pub store: DynRecordStore,
    postgres: Option<DynPostgresStore>,
}

impl StoreHandle {
    pub fn new(store: DynRecordStore) -> Self {
        Self {
            store,
            postgres: None,
        }
    }

    /// Close the connection pool, if any. Called once at shutdown.
    pub async fn close(&self) {
        if let Some(pg) = &self.postgres {
            pg.close().await;
            tracing::info!("PostgreSQL pool closed");
        }
    }
}

/// Connects the configured backend and bounds every call with
/// `storage.timeout_ms`.
pub async fn create_storage(cfg: &AppConfig) -> Result<StoreHandle, StorageError> {
    let timeout = cfg.store_timeout();
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::info!(backend = "memory", "Using in-memory record store");
            let store = TimeoutStore::new(InMemoryStore::new(), timeout);
            Ok(StoreHandle::new(Arc::new(store)))
        }
        StorageBackend::Postgres => {
            let pg_cfg = cfg.storage.postgres.to_postgres_config();
            let pg: DynPostgresStore = Arc::new(PostgresStore::new(pg_cfg).await?);
            tracing::info!(
                backend = "postgres",
                table = pg.schema().table(),
                "Connected to PostgreSQL record store"
            );
            let store = TimeoutStore::new(pg.clone(), timeout);
            Ok(StoreHandle {
                store: Arc::new(store),
                postgres: Some(pg),
            })
        }
    }
}
