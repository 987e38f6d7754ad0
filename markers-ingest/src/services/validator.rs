//! Submission validation
//!
//! Only the marker name is checked: it identifies the marker in every
//! catalog. Timestamps, organisation and label ids are accepted as given.

use markers_common::Marker;

use crate::error::{IngestError, IngestResult};

/// Reject a marker that cannot be ingested
pub fn validate(marker: &Marker) -> IngestResult<()> {
    if marker.name.is_empty() {
        return Err(IngestError::missing_field("name"));
    }
    Ok(())
}
