//! Collection Schema Definitions
//!
//! Single source of truth for the tables backing each logical collection.
//! Table names come from [`CollectionNames`] at runtime, so schemas are built
//! per configuration rather than bound to fixed names.
//!
//! Set-valued document fields (tags, category names, media name sets) are
//! stored as JSON arrays in TEXT columns.

use crate::config::CollectionNames;
use crate::models::LabelKind;
use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER")
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            autoincrement: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// INTEGER PRIMARY KEY AUTOINCREMENT
    pub fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause as used in CREATE TABLE / ALTER TABLE ADD COLUMN
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.autoincrement {
            sql.push_str(" AUTOINCREMENT");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

/// What a collection holds; decides its columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRole {
    Markers,
    Options(LabelKind),
    Ranges(LabelKind),
    Media,
}

/// Expected schema of one collection table
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub table: String,
    pub role: CollectionRole,
    pub columns: Vec<ColumnDefinition>,
}

impl CollectionSchema {
    pub fn new(table: impl Into<String>, role: CollectionRole) -> Self {
        let columns = match role {
            CollectionRole::Markers => marker_columns(),
            CollectionRole::Options(_) => option_columns(),
            CollectionRole::Ranges(_) => range_columns(),
            CollectionRole::Media => media_columns(),
        };
        Self {
            table: table.into(),
            role,
            columns,
        }
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table,
            columns.join(",\n    ")
        )
    }

    /// Index statements run after the table exists
    pub fn index_sql(&self) -> Vec<String> {
        let table = &self.table;
        match self.role {
            // One entry per (value, organisation)
            CollectionRole::Options(_) => vec![format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_value_org \
                 ON {table} (value, organisation_id)"
            )],
            CollectionRole::Ranges(_) => vec![format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_org_value_start \
                 ON {table} (organisation_id, value, start_timestamp)"
            )],
            CollectionRole::Markers => vec![format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_org_start \
                 ON {table} (organisation_id, start_timestamp)"
            )],
            CollectionRole::Media => vec![format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_range \
                 ON {table} (start_timestamp, end_timestamp)"
            )],
        }
    }
}

fn marker_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("id", "TEXT").primary_key(),
        ColumnDefinition::new("name", "TEXT").not_null(),
        ColumnDefinition::new("start_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("end_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("duration", "INTEGER").not_null(),
        ColumnDefinition::new("organisation_id", "TEXT").not_null().default("''"),
        ColumnDefinition::new("device_id", "TEXT").not_null().default("''"),
        ColumnDefinition::new("group_id", "TEXT").not_null().default("''"),
        ColumnDefinition::new("tags", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("events", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("categories", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("created_at", "INTEGER").not_null(),
    ]
}

fn option_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("id", "INTEGER").autoincrement(),
        ColumnDefinition::new("value", "TEXT").not_null(),
        ColumnDefinition::new("text", "TEXT").not_null(),
        ColumnDefinition::new("organisation_id", "TEXT").not_null(),
        // Only filled for the marker-name catalog
        ColumnDefinition::new("categories", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("created_at", "INTEGER").not_null(),
        ColumnDefinition::new("updated_at", "INTEGER").not_null(),
    ]
}

fn range_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("id", "INTEGER").autoincrement(),
        ColumnDefinition::new("value", "TEXT").not_null(),
        ColumnDefinition::new("text", "TEXT").not_null(),
        ColumnDefinition::new("organisation_id", "TEXT").not_null(),
        ColumnDefinition::new("start_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("end_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("device_id", "TEXT").not_null().default("''"),
        ColumnDefinition::new("group_id", "TEXT").not_null().default("''"),
        ColumnDefinition::new("created_at", "INTEGER").not_null(),
        ColumnDefinition::new("updated_at", "INTEGER"),
    ]
}

fn media_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("id", "TEXT").primary_key(),
        ColumnDefinition::new("start_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("end_timestamp", "INTEGER").not_null(),
        ColumnDefinition::new("device_id", "TEXT"),
        ColumnDefinition::new("marker_names", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("tag_names", "TEXT").not_null().default("'[]'"),
        ColumnDefinition::new("event_names", "TEXT").not_null().default("'[]'"),
    ]
}

/// Schemas for every configured collection
pub fn collection_schemas(names: &CollectionNames) -> Vec<CollectionSchema> {
    let mut schemas = vec![CollectionSchema::new(&names.markers, CollectionRole::Markers)];

    for kind in LabelKind::ALL {
        schemas.push(CollectionSchema::new(
            names.options(kind),
            CollectionRole::Options(kind),
        ));
        if let Some(ranges) = names.ranges(kind) {
            schemas.push(CollectionSchema::new(ranges, CollectionRole::Ranges(kind)));
        }
    }

    schemas.push(CollectionSchema::new(&names.media, CollectionRole::Media));
    schemas
}

/// Create missing tables and indexes, then add columns missing from older tables
pub async fn create_collections(pool: &SqlitePool, names: &CollectionNames) -> Result<()> {
    names.validate()?;

    for schema in collection_schemas(names) {
        sqlx::query(&schema.create_table_sql()).execute(pool).await?;
        sync_missing_columns(pool, &schema).await?;
        for index in schema.index_sql() {
            sqlx::query(&index).execute(pool).await?;
        }
        debug!("Collection '{}' ready", schema.table);
    }

    info!("Marker collections initialized");
    Ok(())
}

/// Add expected columns that an existing table lacks
///
/// Only additions are handled; type or constraint changes need a manual
/// migration and are reported as warnings.
pub async fn sync_missing_columns(pool: &SqlitePool, schema: &CollectionSchema) -> Result<()> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", schema.table))
        .fetch_all(pool)
        .await?;
    let actual: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row.get::<String, _>("name"), row.get::<String, _>("type")))
        .collect();

    for column in &schema.columns {
        match actual.iter().find(|(name, _)| name == &column.name) {
            Some((_, actual_type)) => {
                if !actual_type.eq_ignore_ascii_case(&column.sql_type) {
                    warn!(
                        "Column {}.{} has type {} (expected {}), leaving as is",
                        schema.table, column.name, actual_type, column.sql_type
                    );
                }
            }
            None if column.primary_key => {
                warn!(
                    "Table {} lacks primary key column {}; manual migration required",
                    schema.table, column.name
                );
            }
            None => {
                // SQLite refuses ADD COLUMN ... NOT NULL without a default
                let mut add = column.clone();
                if add.not_null && add.default_value.is_none() {
                    add.default_value = Some(if add.sql_type == "INTEGER" {
                        "0".to_string()
                    } else {
                        "''".to_string()
                    });
                }
                let sql = format!("ALTER TABLE {} ADD COLUMN {}", schema.table, add.to_sql());
                sqlx::query(&sql).execute(pool).await?;
                info!("Added column {}.{}", schema.table, column.name);
            }
        }
    }

    Ok(())
}
