//! Configuration loading and resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Collection and database names are never compiled into the pipeline: they
//! travel inside [`IngestConfig`] so that tests and tools can point the
//! writer at an isolated namespace.

use crate::models::LabelKind;
use crate::time;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ENV_ROOT_FOLDER: &str = "MARKERS_ROOT_FOLDER";
pub const ENV_DATABASE: &str = "MARKERS_DATABASE";
pub const ENV_TIMEOUT_SECS: &str = "MARKERS_TIMEOUT_SECS";
pub const ENV_CONFIG_FILE: &str = "MARKERS_CONFIG";

pub const DEFAULT_DATABASE_NAME: &str = "Kerberos";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Names of the logical collections the pipeline writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub markers: String,
    pub marker_options: String,
    pub marker_option_ranges: String,
    pub tag_options: String,
    pub tag_option_ranges: String,
    pub event_options: String,
    pub event_option_ranges: String,
    pub category_options: String,
    /// Externally owned; the pipeline only adds label names to it
    pub media: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            markers: "markers".to_string(),
            marker_options: "marker_options".to_string(),
            marker_option_ranges: "marker_option_ranges".to_string(),
            tag_options: "marker_tag_options".to_string(),
            tag_option_ranges: "marker_tag_option_ranges".to_string(),
            event_options: "marker_event_options".to_string(),
            event_option_ranges: "marker_event_option_ranges".to_string(),
            category_options: "marker_category_options".to_string(),
            media: "media".to_string(),
        }
    }
}

impl CollectionNames {
    /// Default names with `prefix` prepended, e.g. `t1_markers`
    pub fn with_prefix(prefix: &str) -> Self {
        let defaults = Self::default();
        let p = |name: &str| format!("{prefix}{name}");
        Self {
            markers: p(&defaults.markers),
            marker_options: p(&defaults.marker_options),
            marker_option_ranges: p(&defaults.marker_option_ranges),
            tag_options: p(&defaults.tag_options),
            tag_option_ranges: p(&defaults.tag_option_ranges),
            event_options: p(&defaults.event_options),
            event_option_ranges: p(&defaults.event_option_ranges),
            category_options: p(&defaults.category_options),
            media: p(&defaults.media),
        }
    }

    /// Option catalog collection for a label kind
    pub fn options(&self, kind: LabelKind) -> &str {
        match kind {
            LabelKind::Marker => &self.marker_options,
            LabelKind::Tag => &self.tag_options,
            LabelKind::Event => &self.event_options,
            LabelKind::Category => &self.category_options,
        }
    }

    /// Range collection for a label kind, `None` for categories
    pub fn ranges(&self, kind: LabelKind) -> Option<&str> {
        match kind {
            LabelKind::Marker => Some(&self.marker_option_ranges),
            LabelKind::Tag => Some(&self.tag_option_ranges),
            LabelKind::Event => Some(&self.event_option_ranges),
            LabelKind::Category => None,
        }
    }

    /// Every collection name, markers first and media last
    pub fn all(&self) -> Vec<&str> {
        vec![
            self.markers.as_str(),
            self.marker_options.as_str(),
            self.marker_option_ranges.as_str(),
            self.tag_options.as_str(),
            self.tag_option_ranges.as_str(),
            self.event_options.as_str(),
            self.event_option_ranges.as_str(),
            self.category_options.as_str(),
            self.media.as_str(),
        ]
    }

    /// Names must be usable as SQLite identifiers and pairwise distinct
    pub fn validate(&self) -> Result<()> {
        let names = self.all();
        for name in &names {
            validate_identifier(name)?;
        }
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(Error::Config(format!(
                    "Collection name '{name}' is used for more than one collection"
                )));
            }
        }
        Ok(())
    }
}

/// Check that `name` matches `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid name '{name}': expected letters, digits and underscores"
        )))
    }
}

/// Settings readable from the TOML config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub database_name: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub collections: Option<CollectionNames>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_name: Option<String>,
    pub timeout_secs: Option<u64>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved ingestion configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub root_folder: PathBuf,
    /// Logical database; selects the SQLite file `<root_folder>/<name>.db`
    pub database_name: String,
    /// Budget for one `create` call, all stages included
    pub timeout: Duration,
    pub log_level: String,
    pub collections: CollectionNames,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root_folder: get_default_root_folder(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            collections: CollectionNames::default(),
        }
    }
}

impl IngestConfig {
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_collections(mut self, collections: CollectionNames) -> Self {
        self.collections = collections;
        self
    }

    /// SQLite file backing the logical database
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(format!("{}.db", self.database_name))
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.database_name)?;
        if self.timeout.is_zero() {
            return Err(Error::Config("Timeout must be greater than zero".to_string()));
        }
        self.collections.validate()
    }
}

/// Resolve the configuration from CLI overrides, environment, TOML and defaults
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<IngestConfig> {
    let toml_config = match config_file_path(overrides.config_file.as_deref()) {
        Some((path, explicit)) => match load_toml_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            // An explicitly requested file must load
            Err(e) if explicit => return Err(e),
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        None => {
            debug!("No config file found, using defaults");
            TomlConfig::default()
        }
    };

    let root_folder = overrides
        .root_folder
        .clone()
        .or_else(|| std::env::var(ENV_ROOT_FOLDER).ok().map(PathBuf::from))
        .or_else(|| toml_config.root_folder.as_ref().map(PathBuf::from))
        .unwrap_or_else(get_default_root_folder);

    let database_name = overrides
        .database_name
        .clone()
        .or_else(|| std::env::var(ENV_DATABASE).ok())
        .or(toml_config.database_name)
        .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

    let timeout_secs = match overrides.timeout_secs {
        Some(secs) => Some(secs),
        None => match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{ENV_TIMEOUT_SECS}='{raw}' is not a number: {e}"))
            })?),
            Err(_) => toml_config.timeout_secs,
        },
    };

    let config = IngestConfig {
        root_folder,
        database_name,
        timeout: timeout_secs.map(time::secs_to_duration).unwrap_or(DEFAULT_TIMEOUT),
        log_level: toml_config
            .log_level
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        collections: toml_config.collections.unwrap_or_default(),
    };

    config.validate()?;
    Ok(config)
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the config file; the flag tells whether it was requested explicitly
fn config_file_path(cli_path: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = cli_path {
        return Some((path.to_path_buf(), true));
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
        return Some((PathBuf::from(path), true));
    }

    let user_config = dirs::config_dir().map(|d| d.join("markers").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some((path, false));
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/markers/config.toml");
        if system_config.exists() {
            return Some((system_config, false));
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("markers"))
        .unwrap_or_else(|| PathBuf::from("./markers_data"))
}
