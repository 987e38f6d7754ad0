//! Error types for marker ingestion
//!
//! Every pipeline stage failure surfaces immediately, tagged with the stage
//! that failed. Nothing already written is rolled back.

use markers_common::models::LabelKind;
use markers_common::Marker;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage, used to tag failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    PersistMarker,
    UpsertOptions(LabelKind),
    InsertRanges(LabelKind),
    LinkMedia,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => f.write_str("validate marker"),
            Stage::PersistMarker => f.write_str("persist marker"),
            Stage::UpsertOptions(kind) => write!(f, "upsert {kind} options"),
            Stage::InsertRanges(kind) => write!(f, "insert {kind} ranges"),
            Stage::LinkMedia => f.write_str("link media"),
        }
    }
}

/// Why an ingestion call failed
#[derive(Debug, Error)]
pub enum IngestError {
    /// Submission rejected before any write
    #[error("Marker validation failed: {message}")]
    Validation {
        message: String,
        missing_fields: Vec<String>,
    },

    /// Store I/O failure
    #[error("Failed to {stage}: {source}")]
    Storage {
        stage: Stage,
        source: markers_common::Error,
    },

    /// Media identifier is not a valid document id
    #[error("Invalid media id '{media_id}': {reason}")]
    InvalidReference { media_id: String, reason: String },

    /// Call budget elapsed while `stage` was running
    #[error("Timed out after {timeout:?} while trying to {stage}")]
    Timeout { stage: Stage, timeout: Duration },

    /// Caller cancelled while `stage` was running
    #[error("Cancelled while trying to {stage}")]
    Cancelled { stage: Stage },
}

impl IngestError {
    pub fn missing_field(field: &str) -> Self {
        IngestError::Validation {
            message: format!("marker {field} is required"),
            missing_fields: vec![field.to_string()],
        }
    }

    /// Stage the error happened in
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Validation { .. } => Stage::Validate,
            IngestError::Storage { stage, .. }
            | IngestError::Timeout { stage, .. }
            | IngestError::Cancelled { stage } => *stage,
            IngestError::InvalidReference { .. } => Stage::LinkMedia,
        }
    }
}

/// Error returned by `MarkerWriter::create`
///
/// `marker` is set once the marker row exists: the failure happened in a
/// later stage and derived catalogs, ranges or media links may be missing.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct IngestFailure {
    pub marker: Option<Marker>,
    #[source]
    pub error: IngestError,
}

impl IngestFailure {
    /// Failure before the marker was written
    pub fn before_persist(error: IngestError) -> Self {
        Self { marker: None, error }
    }

    /// Failure after the marker was written
    pub fn after_persist(marker: &Marker, error: IngestError) -> Self {
        Self {
            marker: Some(marker.clone()),
            error,
        }
    }

    /// Whether the marker row was written before the failure
    pub fn is_partial(&self) -> bool {
        self.marker.is_some()
    }
}

/// Result type for ingestion calls
pub type IngestResult<T> = Result<T, IngestError>;
