//! # Markers Common Library
//!
//! Shared code for the marker ingestion crates:
//! - Error type
//! - Configuration loading (collection names, database name, timeouts)
//! - Database bootstrap and collection schemas
//! - Marker, option and range document models
//! - Time and identifier utilities

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod time;
pub mod uuid_utils;

pub use config::{CollectionNames, IngestConfig};
pub use error::{Error, Result};
pub use models::{Category, Event, Marker, Tag};
