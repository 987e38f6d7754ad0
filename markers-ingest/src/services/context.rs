//! Per-call deadline and cancellation
//!
//! An [`IngestContext`] bounds one `create` call. Every store operation is
//! raced against the deadline and the cancellation token; whichever fires
//! first ends the call, and writes from earlier stages are kept.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, IngestResult, Stage};

/// Deadline used when the requested timeout overflows the clock (30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline and cancellation boundary for one ingestion call
#[derive(Debug, Clone)]
pub struct IngestContext {
    deadline: Instant,
    timeout: Duration,
    cancellation: CancellationToken,
}

impl IngestContext {
    /// Context expiring `timeout` from now
    ///
    /// Timeouts past the clock's range are clamped to a far-future deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE),
            timeout,
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Run one store operation for `stage` within the boundary
    pub async fn run<T, F>(&self, stage: Stage, operation: F) -> IngestResult<T>
    where
        F: Future<Output = markers_common::Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(IngestError::Cancelled { stage }),
            outcome = tokio::time::timeout_at(self.deadline, operation) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(IngestError::Storage { stage, source }),
                Err(_) => Err(IngestError::Timeout { stage, timeout: self.timeout }),
            },
        }
    }
}
