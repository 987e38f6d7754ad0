//! Media Linker
//!
//! Copies the submission's marker, tag and event names onto each referenced
//! media document whose recording window contains the marker start. Media
//! documents are owned elsewhere; this only ever adds names to their sets.

use markers_common::models::LabelKind;
use markers_common::{uuid_utils, Marker};

use crate::error::{IngestError, IngestResult, Stage};
use crate::services::context::IngestContext;
use crate::services::option_catalog::{distinct_names, label_names};
use crate::services::store::{MarkerStore, MediaLabels};

/// Names of a submission to propagate onto media
pub fn media_labels(marker: &Marker) -> MediaLabels {
    MediaLabels {
        marker_names: distinct_names(label_names(marker, LabelKind::Marker)),
        tag_names: distinct_names(label_names(marker, LabelKind::Tag)),
        event_names: distinct_names(label_names(marker, LabelKind::Event)),
    }
}

/// Link `marker` to every media id in turn
///
/// Empty ids are skipped. A malformed id stops the loop with
/// `InvalidReference`; ids before it stay linked. Returns the number of media
/// documents modified.
pub async fn link_media<S: MarkerStore + ?Sized>(
    store: &S,
    ctx: &IngestContext,
    marker: &Marker,
    media_ids: &[String],
) -> IngestResult<u64> {
    let labels = media_labels(marker);
    let mut modified = 0;

    for raw_id in media_ids {
        if raw_id.is_empty() {
            continue;
        }

        let media_id = uuid_utils::parse(raw_id).map_err(|e| IngestError::InvalidReference {
            media_id: raw_id.clone(),
            reason: e.to_string(),
        })?;

        if labels.is_empty() {
            continue;
        }

        let count = ctx
            .run(
                Stage::LinkMedia,
                store.add_media_labels(media_id, marker.start_timestamp, &labels),
            )
            .await?;

        if count == 0 {
            tracing::debug!(media_id = %media_id, "Media not in range, left unchanged");
        }
        modified += count;
    }

    Ok(modified)
}
