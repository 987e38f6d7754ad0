//! Document identity utilities
//!
//! Every document the pipeline creates is keyed by a UUIDv4, and references to
//! externally owned documents (media) are expected in the same format.

use uuid::Uuid;

/// Generate a new document identity
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a document identity from its textual form
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}
