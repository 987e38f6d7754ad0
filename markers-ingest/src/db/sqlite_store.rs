//! SQLite implementation of [`MarkerStore`]
//!
//! Each collection is a table named by [`CollectionNames`]. Every trait call
//! runs in at most one transaction; nothing spans collections.

use async_trait::async_trait;
use markers_common::models::LabelKind;
use markers_common::{CollectionNames, Error, Marker, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::services::store::{
    union_into, MarkerStore, MediaLabels, OptionUpsert, RangeRecord, UpsertSummary,
};

/// Marker store backed by a SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    collections: CollectionNames,
}

impl SqliteStore {
    /// Wrap a pool whose collections already exist
    pub fn new(pool: SqlitePool, collections: CollectionNames) -> Result<Self> {
        // Names are spliced into SQL text
        collections.validate()?;
        Ok(Self { pool, collections })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }

    fn range_table(&self, kind: LabelKind) -> Result<&str> {
        self.collections.ranges(kind).ok_or_else(|| {
            Error::InvalidInput(format!("{kind} labels have no range collection"))
        })
    }
}

fn decode_set(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}

async fn upsert_one(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    upsert: &OptionUpsert,
) -> Result<bool> {
    let inserted = sqlx::query(&format!(
        "INSERT INTO {table} (value, text, organisation_id, categories, created_at, updated_at)
         VALUES (?, ?, ?, '[]', ?, ?)
         ON CONFLICT(value, organisation_id) DO NOTHING"
    ))
    .bind(&upsert.value)
    .bind(&upsert.value)
    .bind(&upsert.organisation_id)
    .bind(upsert.timestamp)
    .bind(upsert.timestamp)
    .execute(&mut **tx)
    .await?
    .rows_affected()
        == 1;

    if !inserted {
        sqlx::query(&format!(
            "UPDATE {table} SET updated_at = ? WHERE value = ? AND organisation_id = ?"
        ))
        .bind(upsert.timestamp)
        .bind(&upsert.value)
        .bind(&upsert.organisation_id)
        .execute(&mut **tx)
        .await?;
    }

    if !upsert.categories.is_empty() {
        let raw: String = sqlx::query_scalar(&format!(
            "SELECT categories FROM {table} WHERE value = ? AND organisation_id = ?"
        ))
        .bind(&upsert.value)
        .bind(&upsert.organisation_id)
        .fetch_one(&mut **tx)
        .await?;

        let mut categories = decode_set(&raw)?;
        if union_into(&mut categories, &upsert.categories) {
            sqlx::query(&format!(
                "UPDATE {table} SET categories = ? WHERE value = ? AND organisation_id = ?"
            ))
            .bind(serde_json::to_string(&categories)?)
            .bind(&upsert.value)
            .bind(&upsert.organisation_id)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(inserted)
}

#[async_trait]
impl MarkerStore for SqliteStore {
    async fn insert_marker(&self, marker: &Marker) -> Result<Uuid> {
        let id = marker
            .id
            .ok_or_else(|| Error::InvalidInput("marker has no identity".to_string()))?;

        let table = &self.collections.markers;
        let stored: String = sqlx::query_scalar(&format!(
            "INSERT INTO {table} (
                id, name, start_timestamp, end_timestamp, duration,
                organisation_id, device_id, group_id,
                tags, events, categories, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id"
        ))
        .bind(id.to_string())
        .bind(&marker.name)
        .bind(marker.start_timestamp)
        .bind(marker.end_timestamp)
        .bind(marker.duration)
        .bind(&marker.organisation_id)
        .bind(&marker.device_id)
        .bind(&marker.group_id)
        .bind(serde_json::to_string(&marker.tags)?)
        .bind(serde_json::to_string(&marker.events)?)
        .bind(serde_json::to_string(&marker.categories)?)
        .bind(markers_common::time::now_unix())
        .fetch_one(&self.pool)
        .await?;

        Uuid::parse_str(&stored)
            .map_err(|e| Error::Internal(format!("Stored marker id '{stored}' is not a UUID: {e}")))
    }

    async fn upsert_options(&self, kind: LabelKind, batch: &[OptionUpsert]) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        if batch.is_empty() {
            return Ok(summary);
        }

        let table = self.collections.options(kind);
        let mut tx = self.pool.begin().await?;

        for upsert in batch {
            if upsert_one(&mut tx, table, upsert).await? {
                summary.inserted += 1;
            } else {
                summary.matched += 1;
            }
        }

        tx.commit().await?;

        tracing::debug!(
            kind = %kind,
            inserted = summary.inserted,
            matched = summary.matched,
            "Option batch written"
        );

        Ok(summary)
    }

    async fn insert_ranges(&self, kind: LabelKind, batch: &[RangeRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let table = self.range_table(kind)?;
        let sql = format!(
            "INSERT INTO {table} (
                value, text, organisation_id, start_timestamp, end_timestamp,
                device_id, group_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for record in batch {
            written += sqlx::query(&sql)
                .bind(&record.value)
                .bind(&record.text)
                .bind(&record.organisation_id)
                .bind(record.start)
                .bind(record.end)
                .bind(&record.device_id)
                .bind(&record.group_id)
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        Ok(written)
    }

    async fn add_media_labels(
        &self,
        media_id: Uuid,
        marker_start: i64,
        labels: &MediaLabels,
    ) -> Result<u64> {
        let table = &self.collections.media;
        let mut tx = self.pool.begin().await?;

        // Write before reading: a deferred transaction that reads first cannot
        // wait for the WAL write lock and fails with SQLITE_BUSY instead.
        let in_range = sqlx::query(&format!(
            "UPDATE {table} SET id = id
             WHERE id = ? AND start_timestamp <= ? AND end_timestamp >= ?"
        ))
        .bind(media_id.to_string())
        .bind(marker_start)
        .bind(marker_start)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if in_range == 0 {
            // Outside the media's range, or no such media
            return Ok(0);
        }

        let (marker_raw, tag_raw, event_raw): (String, String, String) = sqlx::query_as(&format!(
            "SELECT marker_names, tag_names, event_names FROM {table} WHERE id = ?"
        ))
        .bind(media_id.to_string())
        .fetch_one(&mut *tx)
        .await?;

        let mut marker_names = decode_set(&marker_raw)?;
        let mut tag_names = decode_set(&tag_raw)?;
        let mut event_names = decode_set(&event_raw)?;

        let changed = union_into(&mut marker_names, &labels.marker_names)
            | union_into(&mut tag_names, &labels.tag_names)
            | union_into(&mut event_names, &labels.event_names);

        if !changed {
            return Ok(0);
        }

        sqlx::query(&format!(
            "UPDATE {table} SET marker_names = ?, tag_names = ?, event_names = ? WHERE id = ?"
        ))
        .bind(serde_json::to_string(&marker_names)?)
        .bind(serde_json::to_string(&tag_names)?)
        .bind(serde_json::to_string(&event_names)?)
        .bind(media_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(1)
    }
}
