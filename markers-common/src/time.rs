//! Timestamp utilities
//!
//! Document timestamps (`created_at`, `updated_at`, marker ranges) are Unix
//! seconds stored as SQLite INTEGER.

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as Unix seconds
pub fn now_unix() -> i64 {
    now().timestamp()
}

/// Convert whole seconds to a std duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}
