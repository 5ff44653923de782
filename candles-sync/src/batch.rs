use futures::future::join_all;

use candles_sync_core::{SyncError, SyncReport};

use crate::{SyncEngine, SyncRequest};

/// Outcome of [`SyncEngine::sync_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Reports of every series that synced.
    pub completed: Vec<SyncReport>,
    /// Requests skipped because the exchange had no history at the requested start.
    pub skipped: Vec<(SyncRequest, SyncError)>,
    /// Requests that failed for any other reason.
    pub failed: Vec<(SyncRequest, SyncError)>,
}

impl BatchReport {
    /// True when no request failed (skips do not count as failures).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl SyncEngine {
    /// Sync several requests concurrently; one result per request, in order.
    ///
    /// Requests share only the per-exchange rate limiters. A request that
    /// targets the same series as an earlier one in `requests` is rejected
    /// with `InvalidArg` instead of racing it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candles_sync::sync_many",
            skip(self, requests),
            fields(requests = requests.len()),
        )
    )]
    pub async fn sync_many(
        &self,
        requests: &[SyncRequest],
    ) -> Vec<Result<Vec<SyncReport>, SyncError>> {
        let tasks = requests.iter().enumerate().map(|(i, req)| async move {
            if requests[..i].iter().any(|earlier| earlier.same_target(req)) {
                return Err(SyncError::InvalidArg(format!(
                    "duplicate request for '{req}' in batch"
                )));
            }
            self.sync(req).await
        });
        join_all(tasks).await
    }

    /// Sync several requests concurrently and sort the outcomes.
    ///
    /// Assets that did not exist at the requested start (see
    /// [`SyncError::is_missing_history`]) are skipped rather than failed,
    /// the way a whole-exchange sweep treats late listings.
    pub async fn sync_all(&self, requests: &[SyncRequest]) -> BatchReport {
        let results = self.sync_many(requests).await;
        let mut out = BatchReport::default();
        for (req, result) in requests.iter().zip(results) {
            match result {
                Ok(reports) => out.completed.extend(reports),
                Err(e) if e.is_missing_history() => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(request = %req, error = %e, "skipping, no history at start");
                    out.skipped.push((req.clone(), e));
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(request = %req, error = %e, "sync failed");
                    out.failed.push((req.clone(), e));
                }
            }
        }
        out
    }
}
