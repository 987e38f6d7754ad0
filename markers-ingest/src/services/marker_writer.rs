//! Marker Writer
//!
//! Runs the ingestion pipeline for one submission:
//!
//! 1. validate
//! 2. persist the marker with a fresh identity
//! 3. option catalogs and range logs, kind by kind
//! 4. media links
//!
//! Stages run strictly in sequence. The first failure ends the call and
//! everything written before it stays in place.

use markers_common::models::LabelKind;
use markers_common::{time, uuid_utils, IngestConfig, Marker};
use std::time::Duration;
use tracing::Instrument;

use crate::db::SqliteStore;
use crate::error::{IngestError, IngestFailure, IngestResult, Stage};
use crate::services::context::IngestContext;
use crate::services::media_linker::link_media;
use crate::services::option_catalog::OptionCatalogUpdater;
use crate::services::range_recorder::RangeRecorder;
use crate::services::store::MarkerStore;
use crate::services::validator::validate;

/// Write counts of a successful `create`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub marker: Marker,
    /// Catalog entries inserted or touched, all kinds
    pub options_upserted: u64,
    /// Range records appended, all kinds
    pub ranges_recorded: u64,
    /// Media documents that gained names
    pub media_modified: u64,
}

/// Ingestion pipeline entry point
pub struct MarkerWriter<S> {
    store: S,
    timeout: Duration,
}

impl MarkerWriter<SqliteStore> {
    /// Open the configured database and build a writer on it
    pub async fn open(config: &IngestConfig) -> markers_common::Result<Self> {
        let store = crate::db::open_store(config).await?;
        Ok(Self::new(store, config))
    }
}

impl<S: MarkerStore> MarkerWriter<S> {
    pub fn new(store: S, config: &IngestConfig) -> Self {
        Self {
            store,
            timeout: config.timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fresh context using the configured timeout
    pub fn context(&self) -> IngestContext {
        IngestContext::with_timeout(self.timeout)
    }

    /// Ingest `marker` and link it to `media_ids`
    ///
    /// Returns the persisted marker, with id and duration set. On error the
    /// failure carries the persisted marker if the marker row was written.
    pub async fn create(
        &self,
        ctx: &IngestContext,
        marker: Marker,
        media_ids: &[String],
    ) -> Result<Marker, IngestFailure> {
        self.create_detailed(ctx, marker, media_ids)
            .await
            .map(|outcome| outcome.marker)
    }

    /// `create` bounded by the configured timeout
    pub async fn create_with_defaults(
        &self,
        marker: Marker,
        media_ids: &[String],
    ) -> Result<Marker, IngestFailure> {
        let ctx = self.context();
        self.create(&ctx, marker, media_ids).await
    }

    /// `create`, reporting how many documents each stage wrote
    pub async fn create_detailed(
        &self,
        ctx: &IngestContext,
        marker: Marker,
        media_ids: &[String],
    ) -> Result<CreateOutcome, IngestFailure> {
        let span = tracing::info_span!(
            "marker.create",
            organisation_id = %marker.organisation_id,
            marker_id = tracing::field::Empty,
        );
        self.run_pipeline(ctx, marker, media_ids)
            .instrument(span)
            .await
    }

    async fn run_pipeline(
        &self,
        ctx: &IngestContext,
        mut marker: Marker,
        media_ids: &[String],
    ) -> Result<CreateOutcome, IngestFailure> {
        validate(&marker).map_err(|e| {
            tracing::warn!(error = %e, "Marker rejected");
            IngestFailure::before_persist(e)
        })?;

        marker.duration = marker.computed_duration();
        let marker = self
            .persist(ctx, marker)
            .await
            .map_err(IngestFailure::before_persist)?;

        if let Some(id) = marker.id {
            tracing::Span::current().record("marker_id", tracing::field::display(id));
        }

        let counts = self
            .denormalize(ctx, &marker, media_ids)
            .await
            .map_err(|e| {
                tracing::warn!(stage = %e.stage(), error = %e, "Marker ingestion incomplete");
                IngestFailure::after_persist(&marker, e)
            })?;

        tracing::info!(
            options = counts.0,
            ranges = counts.1,
            media = counts.2,
            "Marker created"
        );

        Ok(CreateOutcome {
            marker,
            options_upserted: counts.0,
            ranges_recorded: counts.1,
            media_modified: counts.2,
        })
    }

    async fn persist(&self, ctx: &IngestContext, mut marker: Marker) -> IngestResult<Marker> {
        let id = uuid_utils::generate();
        marker.id = Some(id);

        tracing::debug!(marker_id = %id, "Persisting marker");
        let stored = ctx
            .run(Stage::PersistMarker, self.store.insert_marker(&marker))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Marker not persisted");
                e
            })?;

        if stored != id {
            return Err(IngestError::Storage {
                stage: Stage::PersistMarker,
                source: markers_common::Error::Internal(format!(
                    "store recorded id {stored}, expected {id}"
                )),
            });
        }
        Ok(marker)
    }

    /// Catalogs, ranges and media links; returns (options, ranges, media)
    async fn denormalize(
        &self,
        ctx: &IngestContext,
        marker: &Marker,
        media_ids: &[String],
    ) -> IngestResult<(u64, u64, u64)> {
        let now = time::now_unix();
        let mut options = 0;
        let mut ranges = 0;

        for kind in LabelKind::ALL {
            let catalog = OptionCatalogUpdater::new(kind);
            let batch = catalog.build_batch(marker, now);
            options += catalog.apply(&self.store, ctx, &batch).await?.total();

            if let Some(recorder) = RangeRecorder::new(kind) {
                let batch = recorder.build_batch(marker, now);
                ranges += recorder.apply(&self.store, ctx, &batch).await?;
            }
        }

        let media = link_media(&self.store, ctx, marker, media_ids).await?;
        Ok((options, ranges, media))
    }
}
