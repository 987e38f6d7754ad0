//! Range Recorder
//!
//! Appends one range record per label occurrence, for time-filtered lookups.
//! Unlike catalogs, repeats are not collapsed: a tag given twice yields two
//! records.

use markers_common::models::LabelKind;
use markers_common::Marker;

use crate::error::{IngestResult, Stage};
use crate::services::context::IngestContext;
use crate::services::store::{MarkerStore, RangeRecord};

/// Range recorder for the marker, tag or event kind
#[derive(Debug, Clone, Copy)]
pub struct RangeRecorder {
    kind: LabelKind,
}

impl RangeRecorder {
    /// `None` for kinds without a range log (categories)
    pub fn new(kind: LabelKind) -> Option<Self> {
        kind.has_ranges().then_some(Self { kind })
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    /// One record per non-empty occurrence in the submission
    pub fn build_batch(&self, marker: &Marker, timestamp: i64) -> Vec<RangeRecord> {
        let record = |name: &str, start: i64, end: i64, updated_at: Option<i64>| RangeRecord {
            value: name.to_string(),
            text: name.to_string(),
            organisation_id: marker.organisation_id.clone(),
            start,
            end,
            device_id: marker.device_id.clone(),
            group_id: marker.group_id.clone(),
            created_at: timestamp,
            updated_at,
        };

        match self.kind {
            LabelKind::Marker if !marker.name.is_empty() => vec![record(
                &marker.name,
                marker.start_timestamp,
                marker.end_timestamp,
                None,
            )],
            LabelKind::Tag => marker
                .tags
                .iter()
                .filter(|t| !t.name.is_empty())
                .map(|t| record(&t.name, marker.start_timestamp, marker.end_timestamp, None))
                .collect(),
            // Events keep their own span
            LabelKind::Event => marker
                .events
                .iter()
                .filter(|e| !e.name.is_empty())
                .map(|e| record(&e.name, e.start_timestamp, e.end_timestamp, Some(timestamp)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Append the batch as one store call; an empty batch writes nothing
    pub async fn apply<S: MarkerStore + ?Sized>(
        &self,
        store: &S,
        ctx: &IngestContext,
        batch: &[RangeRecord],
    ) -> IngestResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        tracing::debug!(kind = %self.kind, records = batch.len(), "Recording ranges");
        ctx.run(Stage::InsertRanges(self.kind), store.insert_ranges(self.kind, batch))
            .await
    }
}
