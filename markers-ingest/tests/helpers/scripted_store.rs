//! Store wrapper for failure injection
//!
//! Delegates to a real store and records which stage each call belongs to.
//! A stage can be made to fail, to stall, or to report a different marker id.

use async_trait::async_trait;
use markers_common::models::LabelKind;
use markers_common::{Error, Marker, Result};
use markers_ingest::services::store::{MediaLabels, OptionUpsert, RangeRecord, UpsertSummary};
use markers_ingest::{MarkerStore, Stage};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub struct ScriptedStore<S> {
    inner: S,
    fail_at: Option<Stage>,
    stall_at: Option<(Stage, Duration)>,
    wrong_marker_id: bool,
    calls: Mutex<Vec<Stage>>,
}

impl<S: MarkerStore> ScriptedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_at: None,
            stall_at: None,
            wrong_marker_id: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call made for `stage`
    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Sleep `delay` before delegating calls made for `stage`
    pub fn stalling_at(mut self, stage: Stage, delay: Duration) -> Self {
        self.stall_at = Some((stage, delay));
        self
    }

    /// Report a fresh id from `insert_marker` instead of the stored one
    pub fn with_wrong_marker_id(mut self) -> Self {
        self.wrong_marker_id = true;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Stages called so far, in call order
    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, stage: Stage) -> Result<()> {
        self.calls.lock().unwrap().push(stage);

        if let Some((stall, delay)) = self.stall_at {
            if stall == stage {
                tokio::time::sleep(delay).await;
            }
        }

        if self.fail_at == Some(stage) {
            return Err(Error::Internal(format!("injected failure: {stage}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: MarkerStore> MarkerStore for ScriptedStore<S> {
    async fn insert_marker(&self, marker: &Marker) -> Result<Uuid> {
        self.enter(Stage::PersistMarker).await?;
        let id = self.inner.insert_marker(marker).await?;
        if self.wrong_marker_id {
            return Ok(Uuid::new_v4());
        }
        Ok(id)
    }

    async fn upsert_options(&self, kind: LabelKind, batch: &[OptionUpsert]) -> Result<UpsertSummary> {
        self.enter(Stage::UpsertOptions(kind)).await?;
        self.inner.upsert_options(kind, batch).await
    }

    async fn insert_ranges(&self, kind: LabelKind, batch: &[RangeRecord]) -> Result<u64> {
        self.enter(Stage::InsertRanges(kind)).await?;
        self.inner.insert_ranges(kind, batch).await
    }

    async fn add_media_labels(
        &self,
        media_id: Uuid,
        marker_start: i64,
        labels: &MediaLabels,
    ) -> Result<u64> {
        self.enter(Stage::LinkMedia).await?;
        self.inner.add_media_labels(media_id, marker_start, labels).await
    }
}
