use candles_sync_types::{ExchangeLimits, Interval, SeriesKey, SyncPlan};

use crate::types::Watermark;

const MINUTE_MS: i64 = 60_000;

/// Time covered by one record of a series, used to estimate record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// One record per this many minutes.
    Minutes(u32),
    /// No fixed bin size; estimates count minutes of calendar time instead.
    Unfixed,
}

impl Cadence {
    /// Cadence of an interval label; calendar months have no fixed cadence.
    #[must_use]
    pub const fn from_interval(interval: &Interval) -> Self {
        match interval.minutes() {
            Some(m) => Self::Minutes(m),
            None => Self::Unfixed,
        }
    }

    /// Milliseconds covered by one estimated record.
    #[must_use]
    pub fn bin_ms(self) -> i64 {
        match self {
            Self::Minutes(m) => i64::from(m.max(1)) * MINUTE_MS,
            Self::Unfixed => MINUTE_MS,
        }
    }
}

/// Computes the minimal fetch window for a series given what is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapPlanner {
    cadence: Cadence,
    max_batch_records: Option<u32>,
}

impl GapPlanner {
    /// Planner for the given cadence and per-request record limit (`None` = unlimited).
    #[must_use]
    pub const fn new(cadence: Cadence, max_batch_records: Option<u32>) -> Self {
        Self {
            cadence,
            max_batch_records,
        }
    }

    /// Planner for a series under an exchange's limits.
    #[must_use]
    pub const fn for_series(series: &SeriesKey, limits: &ExchangeLimits) -> Self {
        Self::new(
            Cadence::from_interval(&series.interval),
            limits.max_batch_records,
        )
    }

    /// The cadence this planner estimates with.
    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Plan the fetch for `[requested_start, requested_end]` against `watermark`.
    ///
    /// - empty store: the whole requested range;
    /// - requested start more than one bin before the stored earliest:
    ///   `[requested_start, earliest)` now, then a resume from the stored latest;
    /// - otherwise: `[latest, requested_end)`.
    ///
    /// A plan whose start is not before its end is empty and has zero batches.
    #[must_use]
    pub fn plan(&self, requested_start: i64, requested_end: i64, watermark: &Watermark) -> SyncPlan {
        let (fetch_start, fetch_end, resume_from) = match (watermark.earliest, watermark.latest) {
            (_, None) => (requested_start, requested_end, None),
            (earliest, Some(latest)) => {
                let earliest = earliest.unwrap_or(latest);
                if i128::from(earliest) - i128::from(requested_start)
                    > i128::from(self.cadence.bin_ms())
                {
                    (requested_start, earliest, Some(latest))
                } else {
                    (latest, requested_end, None)
                }
            }
        };
        let batch_count = if fetch_start >= fetch_end {
            0
        } else {
            self.batch_count(fetch_start, fetch_end)
        };
        SyncPlan {
            batch_count,
            fetch_start,
            fetch_end,
            resume_from,
        }
    }

    /// Records expected in `[start, end)`, rounded up to whole bins.
    #[must_use]
    pub fn estimated_records(&self, start: i64, end: i64) -> u64 {
        let span = (i128::from(end) - i128::from(start)).unsigned_abs();
        let bin = self.cadence.bin_ms().unsigned_abs() as u128;
        u64::try_from(span.div_ceil(bin)).unwrap_or(u64::MAX)
    }

    fn batch_count(&self, start: i64, end: i64) -> u32 {
        match self.max_batch_records {
            None => 1,
            Some(max) => {
                let estimated = self.estimated_records(start, end);
                let batches = estimated.div_ceil(u64::from(max.max(1))).max(1);
                u32::try_from(batches).unwrap_or(u32::MAX)
            }
        }
    }
}
