//! Database access for marker ingestion

pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

use markers_common::{IngestConfig, Result};

/// Open the configured database and wrap it in a store
pub async fn open_store(config: &IngestConfig) -> Result<SqliteStore> {
    let pool = markers_common::db::init_database_for(config).await?;
    tracing::debug!(
        database = %config.database_name,
        path = %config.database_path().display(),
        "Marker store opened"
    );
    SqliteStore::new(pool, config.collections.clone())
}
