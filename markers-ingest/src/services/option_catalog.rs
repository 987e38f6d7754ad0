//! Option Catalog Updater
//!
//! Keeps one entry per (organisation, kind, distinct label value) so the UI
//! can list known marker names, tags, events and categories without scanning
//! markers. Labels repeated within one submission collapse to one upsert.

use markers_common::models::LabelKind;
use markers_common::Marker;

use crate::error::{IngestResult, Stage};
use crate::services::context::IngestContext;
use crate::services::store::{MarkerStore, OptionUpsert, UpsertSummary};

/// Distinct non-empty names, in first-occurrence order
pub fn distinct_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !distinct.iter().any(|n| n == name) {
            distinct.push(name.to_string());
        }
    }
    distinct
}

/// Label names of `kind` in a submission, every occurrence, empty ones skipped
pub fn label_names(marker: &Marker, kind: LabelKind) -> Vec<&str> {
    let names: Vec<&str> = match kind {
        LabelKind::Marker => vec![marker.name.as_str()],
        LabelKind::Tag => marker.tags.iter().map(|t| t.name.as_str()).collect(),
        LabelKind::Event => marker.events.iter().map(|e| e.name.as_str()).collect(),
        LabelKind::Category => marker.categories.iter().map(|c| c.name.as_str()).collect(),
    };
    names.into_iter().filter(|n| !n.is_empty()).collect()
}

/// Catalog updater for one label kind
#[derive(Debug, Clone, Copy)]
pub struct OptionCatalogUpdater {
    kind: LabelKind,
}

impl OptionCatalogUpdater {
    pub fn new(kind: LabelKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Build the upsert batch for a submission
    pub fn build_batch(&self, marker: &Marker, timestamp: i64) -> Vec<OptionUpsert> {
        // Marker-name entries remember which categories they were filed under
        let categories = match self.kind {
            LabelKind::Marker => distinct_names(label_names(marker, LabelKind::Category)),
            _ => Vec::new(),
        };

        distinct_names(label_names(marker, self.kind))
            .into_iter()
            .map(|value| OptionUpsert {
                value,
                organisation_id: marker.organisation_id.clone(),
                categories: categories.clone(),
                timestamp,
            })
            .collect()
    }

    /// Write the batch as one store call; an empty batch writes nothing
    pub async fn apply<S: MarkerStore + ?Sized>(
        &self,
        store: &S,
        ctx: &IngestContext,
        batch: &[OptionUpsert],
    ) -> IngestResult<UpsertSummary> {
        if batch.is_empty() {
            return Ok(UpsertSummary::default());
        }

        let stage = Stage::UpsertOptions(self.kind);
        tracing::debug!(kind = %self.kind, upserts = batch.len(), "Upserting options");
        ctx.run(stage, store.upsert_options(self.kind, batch)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_marker() -> Marker {
        Marker::new("Motion", 100, 110)
            .with_organisation("A")
            .with_tag("high-priority")
            .with_tag("")
            .with_tag("high-priority")
            .with_tag("night")
            .with_category("security")
            .with_category("security")
            .with_category("")
    }

    #[test]
    fn test_distinct_names_keeps_first_occurrence_order() {
        assert_eq!(distinct_names(["b", "a", "", "b", "c"]), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_tag_batch_collapses_repeats() {
        let batch = OptionCatalogUpdater::new(LabelKind::Tag).build_batch(&sample_marker(), 7);
        let values: Vec<&str> = batch.iter().map(|u| u.value.as_str()).collect();
        assert_eq!(values, vec!["high-priority", "night"]);
        assert!(batch.iter().all(|u| u.organisation_id == "A" && u.timestamp == 7));
        assert!(batch.iter().all(|u| u.categories.is_empty()));
    }

    #[test]
    fn test_marker_batch_carries_categories() {
        let batch = OptionCatalogUpdater::new(LabelKind::Marker).build_batch(&sample_marker(), 7);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].value, "Motion");
        assert_eq!(batch[0].categories, vec!["security".to_string()]);
    }

    #[test]
    fn test_empty_kind_builds_empty_batch() {
        let batch = OptionCatalogUpdater::new(LabelKind::Event).build_batch(&sample_marker(), 7);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_label_names_skips_empty() {
        assert_eq!(label_names(&sample_marker(), LabelKind::Tag).len(), 3);
        assert_eq!(label_names(&Marker::new("", 0, 0), LabelKind::Marker).len(), 0);
    }
}
