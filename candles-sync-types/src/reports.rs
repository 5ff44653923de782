//! Report envelopes produced by the sync engine.

use serde::{Deserialize, Serialize};

use crate::error::SyncPhase;
use crate::plan::SyncPlan;
use crate::series::SeriesKey;

/// Lifecycle of one sync invocation.
///
/// `Idle → RangeResolved → Fetching → (ResumePending → Fetching) → Done`;
/// `Error` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    /// Nothing has happened yet.
    Idle,
    /// Start/end defaults have been applied.
    RangeResolved,
    /// Windows of a phase are being fetched and written.
    Fetching,
    /// The initial phase backfilled older history; a resume phase is due.
    ResumePending,
    /// All phases completed (or there was nothing to do).
    Done,
    /// The run aborted.
    Error,
}

/// Outcome of one phase of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Which phase this is.
    pub phase: SyncPhase,
    /// The plan computed for the phase.
    pub plan: SyncPlan,
    /// Number of windows fetched (one fetch per sub-endpoint per window).
    pub windows_fetched: u32,
    /// Number of canonical records handed to the store.
    pub records_written: u64,
}

/// Summary of a completed sync run for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// The synced series.
    pub series: SeriesKey,
    /// Phases that ran, in order. Empty-plan phases are included with zero windows.
    pub phases: Vec<PhaseReport>,
    /// Final state of the run.
    pub state: SyncState,
}

impl SyncReport {
    /// Total records written across phases.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.phases.iter().map(|p| p.records_written).sum()
    }

    /// Total windows fetched across phases.
    #[must_use]
    pub fn windows_fetched(&self) -> u32 {
        self.phases.iter().map(|p| p.windows_fetched).sum()
    }

    /// True when no phase had anything to fetch.
    #[must_use]
    pub fn was_noop(&self) -> bool {
        self.phases.iter().all(|p| p.plan.is_empty())
    }
}
