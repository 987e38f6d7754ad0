//! Marker document models
//!
//! Wire names follow the camelCase used by the clients that submit markers
//! (`startTimestamp`, `organisationId`, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, time-ranged annotation on a device stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Assigned when the marker is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_timestamp: i64,
    #[serde(default)]
    pub end_timestamp: i64,
    /// Derived on persist: `end_timestamp - start_timestamp`
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub organisation_id: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Marker {
    /// Create a marker with a name and time range, everything else empty
    pub fn new(name: impl Into<String>, start_timestamp: i64, end_timestamp: i64) -> Self {
        Self {
            name: name.into(),
            start_timestamp,
            end_timestamp,
            ..Default::default()
        }
    }

    pub fn with_organisation(mut self, organisation_id: impl Into<String>) -> Self {
        self.organisation_id = organisation_id.into();
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self.group_id = group_id.into();
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name));
        self
    }

    pub fn with_event(mut self, name: impl Into<String>, start: i64, end: i64) -> Self {
        self.events.push(Event::new(name, start, end));
        self
    }

    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        self.categories.push(Category::new(name));
        self
    }

    /// Time span covered by the marker. Negative when end precedes start;
    /// wraps at the ends of the i64 range instead of panicking.
    pub fn computed_duration(&self) -> i64 {
        self.end_timestamp.wrapping_sub(self.start_timestamp)
    }
}

/// Free-form label attached to a marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Classification of a marker (e.g. "security", "traffic")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Something that happened inside a marker, with its own time range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_timestamp: i64,
    #[serde(default)]
    pub end_timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, start_timestamp: i64, end_timestamp: i64) -> Self {
        Self {
            name: name.into(),
            start_timestamp,
            end_timestamp,
            description: None,
        }
    }
}

/// Label kinds that get a per-organisation option catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Marker,
    Tag,
    Event,
    Category,
}

impl LabelKind {
    pub const ALL: [LabelKind; 4] = [
        LabelKind::Marker,
        LabelKind::Tag,
        LabelKind::Event,
        LabelKind::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Marker => "marker",
            LabelKind::Tag => "tag",
            LabelKind::Event => "event",
            LabelKind::Category => "category",
        }
    }

    /// Whether range records are kept for this kind (categories have none)
    pub fn has_ranges(&self) -> bool {
        !matches!(self, LabelKind::Category)
    }
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
