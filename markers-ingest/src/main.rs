//! markers-ingest - ingest one marker from the command line
//!
//! Reads a marker as JSON (camelCase fields) from a file or stdin, runs the
//! ingestion pipeline against the configured database and prints the stored
//! marker.

use anyhow::{Context, Result};
use clap::Parser;
use markers_common::config::{resolve_config, ConfigOverrides};
use markers_common::{db, Marker};
use markers_ingest::{IngestFailure, MarkerWriter, SqliteStore};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "markers-ingest", version, about = "Ingest a marker and update its lookup collections")]
struct Args {
    /// Folder holding the database files
    #[arg(long, env = "MARKERS_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Logical database name
    #[arg(long = "database", env = "MARKERS_DATABASE")]
    database_name: Option<String>,

    /// Budget for the whole ingestion call, in seconds
    #[arg(long, env = "MARKERS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// TOML configuration file
    #[arg(long, env = "MARKERS_CONFIG")]
    config: Option<PathBuf>,

    /// Media document to link the marker to (repeatable)
    #[arg(long = "media-id")]
    media_ids: Vec<String>,

    /// Run against a throwaway in-memory database
    #[arg(long)]
    in_memory: bool,

    /// Marker JSON file; stdin when omitted
    marker_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(&ConfigOverrides {
        root_folder: args.root_folder.clone(),
        database_name: args.database_name.clone(),
        timeout_secs: args.timeout_secs,
        config_file: args.config.clone(),
    })
    .context("Failed to resolve configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting markers-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let marker = read_marker(args.marker_json.as_deref())?;

    let writer = if args.in_memory {
        let pool = db::connect_in_memory(&config.collections).await?;
        MarkerWriter::new(SqliteStore::new(pool, config.collections.clone())?, &config)
    } else {
        info!("Database path: {}", config.database_path().display());
        MarkerWriter::open(&config)
            .await
            .context("Failed to open marker database")?
    };

    match writer.create_with_defaults(marker, &args.media_ids).await {
        Ok(stored) => {
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(())
        }
        Err(failure) => {
            report_failure(&failure);
            Err(failure.into())
        }
    }
}

fn read_marker(path: Option<&std::path::Path>) -> Result<Marker> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read marker from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Marker JSON is malformed")
}

fn report_failure(failure: &IngestFailure) {
    match failure.marker.as_ref().and_then(|m| m.id) {
        Some(id) => error!(
            marker_id = %id,
            stage = %failure.error.stage(),
            "Marker stored but ingestion incomplete: {}",
            failure.error
        ),
        None => error!("Marker not stored: {}", failure.error),
    }
}
