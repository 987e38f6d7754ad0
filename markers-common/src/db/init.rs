//! Database initialization
//!
//! One SQLite file per logical database. Opening is idempotent: tables and
//! indexes are created when missing, existing data is left alone.

use crate::config::{CollectionNames, IngestConfig};
use crate::db::schema::create_collections;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Busy timeout applied to every connection, in milliseconds
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (creating if needed) the database for `config` and its collections
pub async fn init_database_for(config: &IngestConfig) -> Result<SqlitePool> {
    config.validate()?;
    init_database(&config.database_path(), &config.collections).await
}

/// Initialize database connection and create collections if needed
pub async fn init_database(db_path: &Path, collections: &CollectionNames) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_collections(&pool, collections).await?;

    Ok(pool)
}

/// In-memory database with all collections, for tests and dry runs
///
/// Uses a single connection that is never recycled: every SQLite `:memory:`
/// connection is its own database.
pub async fn connect_in_memory(collections: &CollectionNames) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_collections(&pool, collections).await?;

    Ok(pool)
}
