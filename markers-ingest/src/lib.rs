//! Marker ingestion and denormalization
//!
//! Persists markers and keeps the derived collections in step: per
//! organisation option catalogs, time range logs and media label sets.

pub mod db;
pub mod error;
pub mod services;

pub use db::SqliteStore;
pub use error::{IngestError, IngestFailure, IngestResult, Stage};
pub use services::{CreateOutcome, IngestContext, MarkerStore, MarkerWriter};
