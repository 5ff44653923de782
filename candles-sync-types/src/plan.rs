use serde::{Deserialize, Serialize};

/// Minimal fetch window computed from the store watermark for one phase.
///
/// Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Number of API-sized batches the window is split into.
    pub batch_count: u32,
    /// Inclusive start of the window.
    pub fetch_start: i64,
    /// End of the window.
    pub fetch_end: i64,
    /// Where a second phase must start after a backfill, if any.
    pub resume_from: Option<i64>,
}

impl SyncPlan {
    /// True when the requested range is already covered by the store.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fetch_start >= self.fetch_end
    }
}
