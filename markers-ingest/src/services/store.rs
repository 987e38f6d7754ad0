//! Store seam for the ingestion pipeline
//!
//! The pipeline needs four write primitives, each scoped to one collection:
//! insert-one for markers, batch upsert for option catalogs, batch insert for
//! range logs, and a conditional set-union update for media documents.
//! Implementations guarantee atomicity per call (one batch) but never across
//! calls.

use async_trait::async_trait;
use markers_common::models::LabelKind;
use markers_common::{Marker, Result};
use uuid::Uuid;

/// One catalog upsert keyed by (value, organisation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionUpsert {
    pub value: String,
    pub organisation_id: String,
    /// Category names to union into the entry (marker-name catalog only)
    pub categories: Vec<String>,
    /// Used as created_at on insert and updated_at on every match
    pub timestamp: i64,
}

/// Outcome of one catalog batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: u64,
    pub matched: u64,
}

impl UpsertSummary {
    pub fn total(&self) -> u64 {
        self.inserted + self.matched
    }
}

/// One occurrence of a label and the time span it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRecord {
    pub value: String,
    pub text: String,
    pub organisation_id: String,
    pub start: i64,
    pub end: i64,
    pub device_id: String,
    pub group_id: String,
    pub created_at: i64,
    /// Only event ranges carry an update timestamp
    pub updated_at: Option<i64>,
}

/// Label names to add to a media document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLabels {
    pub marker_names: Vec<String>,
    pub tag_names: Vec<String>,
    pub event_names: Vec<String>,
}

impl MediaLabels {
    pub fn is_empty(&self) -> bool {
        self.marker_names.is_empty() && self.tag_names.is_empty() && self.event_names.is_empty()
    }
}

/// Write primitives the pipeline runs against
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Insert the marker as a new document, returning the identity the store
    /// recorded for it
    async fn insert_marker(&self, marker: &Marker) -> Result<Uuid>;

    /// Upsert a whole catalog batch for `kind` in one atomic write
    async fn upsert_options(&self, kind: LabelKind, batch: &[OptionUpsert]) -> Result<UpsertSummary>;

    /// Append a whole range batch for `kind` in one atomic write, returning
    /// the number of records written
    async fn insert_ranges(&self, kind: LabelKind, batch: &[RangeRecord]) -> Result<u64>;

    /// Union `labels` into the media document `media_id` if its time range
    /// contains `marker_start`. Returns the number of documents modified; zero
    /// when nothing matched.
    async fn add_media_labels(
        &self,
        media_id: Uuid,
        marker_start: i64,
        labels: &MediaLabels,
    ) -> Result<u64>;
}

/// Append members of `additions` missing from `set`, keeping existing order
///
/// Returns true when `set` changed.
pub fn union_into(set: &mut Vec<String>, additions: &[String]) -> bool {
    let mut changed = false;
    for item in additions {
        if !set.contains(item) {
            set.push(item.clone());
            changed = true;
        }
    }
    changed
}
