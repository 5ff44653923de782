use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use candles_sync_core::{CanonicalRecord, SeriesKey, SeriesStore, SyncError, Watermark};

#[derive(Default)]
struct StoreState {
    series: HashMap<SeriesKey, BTreeMap<i64, CanonicalRecord>>,
    write_calls: Vec<(SeriesKey, usize)>,
    fail_writes: Option<String>,
}

/// In-memory series store.
///
/// Records are kept per series keyed by timestamp; writing the same
/// timestamp again replaces the record, like a time-series database point.
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records directly, bypassing the write log.
    pub async fn seed(&self, series: &SeriesKey, records: Vec<CanonicalRecord>) {
        let mut guard = self.state.lock().await;
        let stored = guard.series.entry(series.clone()).or_default();
        for r in records {
            stored.insert(r.time_ms, r);
        }
    }

    /// Stored records of `series`, oldest first.
    pub async fn records(&self, series: &SeriesKey) -> Vec<CanonicalRecord> {
        let guard = self.state.lock().await;
        guard
            .series
            .get(series)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `write_batch` calls and the batch size of each, in order.
    pub async fn write_calls(&self) -> Vec<(SeriesKey, usize)> {
        self.state.lock().await.write_calls.clone()
    }

    /// Make every following write fail with `msg`; `None` restores normal writes.
    pub async fn fail_writes(&self, msg: Option<&str>) {
        self.state.lock().await.fail_writes = msg.map(str::to_string);
    }
}

#[async_trait]
impl SeriesStore for MemoryStore {
    async fn get_watermark(&self, series: &SeriesKey) -> Result<Watermark, SyncError> {
        let guard = self.state.lock().await;
        let Some(stored) = guard.series.get(series) else {
            return Ok(Watermark::EMPTY);
        };
        Ok(Watermark {
            earliest: stored.keys().next().copied(),
            latest: stored.keys().next_back().copied(),
        })
    }

    async fn write_batch(
        &self,
        series: &SeriesKey,
        records: Vec<CanonicalRecord>,
    ) -> Result<(), SyncError> {
        let mut guard = self.state.lock().await;
        if let Some(msg) = &guard.fail_writes {
            return Err(SyncError::Store(msg.clone()));
        }
        guard.write_calls.push((series.clone(), records.len()));
        let stored = guard.series.entry(series.clone()).or_default();
        for r in records {
            stored.insert(r.time_ms, r);
        }
        Ok(())
    }
}
