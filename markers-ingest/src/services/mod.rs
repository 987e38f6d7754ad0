//! Ingestion pipeline stages

pub mod context;
pub mod marker_writer;
pub mod media_linker;
pub mod option_catalog;
pub mod range_recorder;
pub mod store;
pub mod validator;

pub use context::IngestContext;
pub use marker_writer::{CreateOutcome, MarkerWriter};
pub use store::MarkerStore;
