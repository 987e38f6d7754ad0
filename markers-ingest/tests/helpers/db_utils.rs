//! Database Test Utilities
//!
//! In-memory stores, seeded media documents and row readers for asserting
//! on what the pipeline wrote.

use markers_common::db::connect_in_memory;
use markers_common::{CollectionNames, IngestConfig};
use markers_ingest::{MarkerStore, MarkerWriter, SqliteStore};
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

/// In-memory store with every default collection created
pub async fn create_test_store() -> SqliteStore {
    let names = CollectionNames::default();
    let pool = connect_in_memory(&names).await.expect("in-memory database");
    SqliteStore::new(pool, names).expect("valid collection names")
}

/// Writer over `store` with a generous timeout
pub fn create_test_writer<S: MarkerStore>(store: S) -> MarkerWriter<S> {
    let config = IngestConfig::default().with_timeout(Duration::from_secs(30));
    MarkerWriter::new(store, &config)
}

/// Insert a media document covering [start, end]; returns its id
pub async fn seed_media(store: &SqliteStore, start: i64, end: i64) -> Uuid {
    let id = Uuid::new_v4();
    let table = &store.collections().media;
    sqlx::query(&format!(
        "INSERT INTO {table} (id, start_timestamp, end_timestamp, device_id) VALUES (?, ?, ?, ?)"
    ))
    .bind(id.to_string())
    .bind(start)
    .bind(end)
    .bind("cam-1")
    .execute(store.pool())
    .await
    .expect("seed media");
    id
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}

#[derive(Debug, sqlx::FromRow)]
pub struct OptionRow {
    pub value: String,
    pub text: String,
    pub organisation_id: String,
    pub categories: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OptionRow {
    pub fn category_set(&self) -> Vec<String> {
        serde_json::from_str(&self.categories).expect("categories JSON")
    }
}

/// Catalog entries of `table`, in insertion order
pub async fn fetch_options(pool: &SqlitePool, table: &str) -> Vec<OptionRow> {
    sqlx::query_as(&format!(
        "SELECT value, text, organisation_id, categories, created_at, updated_at
         FROM {table} ORDER BY id"
    ))
    .fetch_all(pool)
    .await
    .expect("fetch options")
}

#[derive(Debug, sqlx::FromRow)]
pub struct RangeRow {
    pub value: String,
    pub organisation_id: String,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub device_id: String,
    pub updated_at: Option<i64>,
}

/// Range records of `table`, in insertion order
pub async fn fetch_ranges(pool: &SqlitePool, table: &str) -> Vec<RangeRow> {
    sqlx::query_as(&format!(
        "SELECT value, organisation_id, start_timestamp, end_timestamp, device_id, updated_at
         FROM {table} ORDER BY id"
    ))
    .fetch_all(pool)
    .await
    .expect("fetch ranges")
}

#[derive(Debug, PartialEq)]
pub struct MediaRow {
    pub marker_names: Vec<String>,
    pub tag_names: Vec<String>,
    pub event_names: Vec<String>,
}

pub async fn fetch_media(store: &SqliteStore, id: Uuid) -> MediaRow {
    let table = &store.collections().media;
    let (marker_raw, tag_raw, event_raw): (String, String, String) = sqlx::query_as(&format!(
        "SELECT marker_names, tag_names, event_names FROM {table} WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_one(store.pool())
    .await
    .expect("fetch media");

    MediaRow {
        marker_names: serde_json::from_str(&marker_raw).expect("marker_names JSON"),
        tag_names: serde_json::from_str(&tag_raw).expect("tag_names JSON"),
        event_names: serde_json::from_str(&event_raw).expect("event_names JSON"),
    }
}
