use async_trait::async_trait;

use crate::types::{CanonicalRecord, Watermark};
use crate::{SeriesKey, SyncError};

/// Time-series store as seen by the engine.
///
/// The engine only reads watermarks and appends batches; deduplication of
/// records written twice is not expected from the store.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Earliest and latest timestamps currently stored for `series`.
    async fn get_watermark(&self, series: &SeriesKey) -> Result<Watermark, SyncError>;

    /// Persist a batch of records for `series`.
    async fn write_batch(
        &self,
        series: &SeriesKey,
        records: Vec<CanonicalRecord>,
    ) -> Result<(), SyncError>;
}
