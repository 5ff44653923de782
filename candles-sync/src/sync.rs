//! One sync run: resolve the range, plan against the store, fetch window by
//! window, normalize and write; then resume up to now after a backfill.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Map;

use candles_sync_core::{
    CanonicalRecord, DataType, EndpointMode, ExchangeAdapter, ExchangeId, FetchParams, GapPlanner,
    Interval, Normalizer, PhaseReport, RawRecord, SyncError, SyncPhase, SyncReport, SyncState,
    window_boundaries,
};

use crate::SyncEngine;
use crate::catalog::{self, SyncJob, SyncStrategy};

const DAY_MS: i64 = 86_400_000;

/// What to sync: one symbol of one exchange and data type, over an optional range.
///
/// Timestamps are milliseconds since the epoch. Missing bounds default to
/// the strategy's default window ending now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Exchange to sync from.
    pub exchange: ExchangeId,
    /// Kind of series.
    pub data_type: DataType,
    /// Exchange symbol, verbatim.
    pub symbol: String,
    /// Requested interval (some data types force their own).
    pub interval: Interval,
    /// Inclusive start of the requested range.
    pub start_ms: Option<i64>,
    /// End of the requested range.
    pub end_ms: Option<i64>,
    /// Extra query parameters added to every request.
    pub extra_params: FetchParams,
}

impl SyncRequest {
    /// Request over the default range.
    pub fn new(
        exchange: ExchangeId,
        data_type: DataType,
        symbol: impl Into<String>,
        interval: Interval,
    ) -> Self {
        Self {
            exchange,
            data_type,
            symbol: symbol.into(),
            interval,
            start_ms: None,
            end_ms: None,
            extra_params: FetchParams::new(),
        }
    }

    /// Candle request over the default range.
    pub fn candles(exchange: ExchangeId, symbol: impl Into<String>, interval: Interval) -> Self {
        Self::new(exchange, DataType::Candles, symbol, interval)
    }

    /// Set the start of the range.
    #[must_use]
    pub const fn start(mut self, start_ms: i64) -> Self {
        self.start_ms = Some(start_ms);
        self
    }

    /// Set the end of the range.
    #[must_use]
    pub const fn end(mut self, end_ms: i64) -> Self {
        self.end_ms = Some(end_ms);
        self
    }

    /// Set both ends of the range.
    #[must_use]
    pub const fn range(self, start_ms: i64, end_ms: i64) -> Self {
        self.start(start_ms).end(end_ms)
    }

    /// Add a query parameter sent with every request.
    #[must_use]
    pub fn extra_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(name.into(), value.into());
        self
    }

    pub(crate) fn same_target(&self, other: &Self) -> bool {
        self.exchange == other.exchange
            && self.data_type == other.data_type
            && self.symbol.trim() == other.symbol.trim()
            && self.interval == other.interval
    }
}

impl std::fmt::Display for SyncRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.exchange, self.symbol, self.interval, self.data_type
        )
    }
}

fn iso(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Everything needed to sync one series, validated before any network call.
struct SeriesRun<'a> {
    engine: &'a SyncEngine,
    adapter: &'a Arc<dyn ExchangeAdapter>,
    strategy: &'a SyncStrategy,
    job: SyncJob,
    params: FetchParams,
    normalizer: Normalizer,
    planner: GapPlanner,
}

impl SyncEngine {
    /// Sync one request and return one report per synced series.
    ///
    /// Configuration problems (unknown exchange/data type, reserved
    /// parameters or tags, missing adapter, bad range) are reported before
    /// any network call. Series of a request run sequentially; the first
    /// failure aborts the request, and batches already written stay written.
    ///
    /// # Errors
    /// Configuration errors are returned as is; failures while syncing a
    /// series are wrapped in `SyncError::Phase`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candles_sync::sync",
            skip(self, request),
            fields(
                exchange = %request.exchange,
                data_type = %request.data_type,
                symbol = %request.symbol,
                interval = %request.interval,
            ),
        )
    )]
    pub async fn sync(&self, request: &SyncRequest) -> Result<Vec<SyncReport>, SyncError> {
        let strategy = catalog::strategy_for(request.exchange, request.data_type)?;
        let (start, end) = self.resolve_range(request, &strategy)?;
        let runs = self.prepare(request, &strategy)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            start = %iso(start),
            end = %iso(end),
            series = runs.len(),
            "range resolved"
        );

        let mut reports = Vec::with_capacity(runs.len());
        for run in &runs {
            reports.push(run.execute(start, end).await?);
        }
        Ok(reports)
    }

    fn resolve_range(
        &self,
        request: &SyncRequest,
        strategy: &SyncStrategy,
    ) -> Result<(i64, i64), SyncError> {
        let span = i64::from(strategy.limits.default_sync_days).saturating_mul(DAY_MS);
        let (start, end) = match (request.start_ms, request.end_ms) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, self.clock.now_ms()),
            (None, Some(end)) => (end.saturating_sub(span), end),
            (None, None) => {
                let now = self.clock.now_ms();
                (now.saturating_sub(span), now)
            }
        };
        if start > end {
            return Err(SyncError::InvalidArg(format!(
                "start {} is after end {}",
                iso(start),
                iso(end)
            )));
        }
        Ok((start, end))
    }

    fn prepare<'a>(
        &'a self,
        request: &SyncRequest,
        strategy: &'a SyncStrategy,
    ) -> Result<Vec<SeriesRun<'a>>, SyncError> {
        strategy.request.check_extra(&request.extra_params)?;
        let adapter = self.adapter(request.exchange).ok_or_else(|| {
            SyncError::no_such_adapter(request.exchange.as_str(), request.data_type.as_str())
        })?;
        let layout = strategy
            .layout
            .clone()
            .unwrap_or_else(|| adapter.candle_field_layout());

        strategy
            .jobs(&request.symbol, &request.interval)?
            .into_iter()
            .map(|job| {
                if let Some(param) = request
                    .extra_params
                    .keys()
                    .find(|k| job.params.contains_key(k.as_str()))
                {
                    return Err(SyncError::ReservedParam {
                        param: param.clone(),
                    });
                }
                let mut params = job.params.clone();
                params.extend(
                    request
                        .extra_params
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                let normalizer =
                    Normalizer::new(layout.clone(), strategy.record_unit, &job.series, &job.tags)?;
                let planner = GapPlanner::for_series(&job.series, &strategy.limits);
                Ok(SeriesRun {
                    engine: self,
                    adapter,
                    strategy,
                    job,
                    params,
                    normalizer,
                    planner,
                })
            })
            .collect()
    }
}

impl SeriesRun<'_> {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candles_sync::sync::series",
            skip(self),
            fields(series = %self.job.series),
        )
    )]
    async fn execute(&self, start: i64, end: i64) -> Result<SyncReport, SyncError> {
        let series = &self.job.series;
        let mut state = SyncState::RangeResolved;
        let mut phases = Vec::with_capacity(2);

        let initial = self
            .run_phase(SyncPhase::Initial, start, end, &mut state)
            .await
            .map_err(|e| self.fail(e, SyncPhase::Initial, &mut state))?;
        let resume_from = initial.plan.resume_from;
        phases.push(initial);

        if let Some(from) = resume_from {
            self.transition(&mut state, SyncState::ResumePending);
            let now = self.engine.clock.now_ms();
            let resumed = self
                .run_phase(SyncPhase::Resume, from, now, &mut state)
                .await
                .map_err(|e| self.fail(e, SyncPhase::Resume, &mut state))?;
            phases.push(resumed);
        }

        self.transition(&mut state, SyncState::Done);
        Ok(SyncReport {
            series: series.clone(),
            phases,
            state,
        })
    }

    async fn run_phase(
        &self,
        phase: SyncPhase,
        start: i64,
        end: i64,
        state: &mut SyncState,
    ) -> Result<PhaseReport, SyncError> {
        let store = &self.engine.store;
        let series = &self.job.series;
        let watermark = store.get_watermark(series).await?;
        let plan = self.planner.plan(start, end, &watermark);
        let mut report = PhaseReport {
            phase,
            plan,
            windows_fetched: 0,
            records_written: 0,
        };
        if plan.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                %phase,
                fetch_start = %iso(plan.fetch_start),
                fetch_end = %iso(plan.fetch_end),
                "nothing to sync"
            );
            return Ok(report);
        }

        self.transition(state, SyncState::Fetching);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            %phase,
            fetch_start = %iso(plan.fetch_start),
            fetch_end = %iso(plan.fetch_end),
            batches = plan.batch_count,
            resume_from = ?plan.resume_from,
            "syncing"
        );

        let windows = window_boundaries(plan.fetch_start, plan.fetch_end, plan.batch_count).pairs();
        for (i, (window_start, window_end)) in windows.enumerate() {
            let params = self.strategy.request.params_for_window(
                window_start,
                window_end,
                self.strategy.limits.max_batch_records,
                &self.params,
            );
            #[cfg(feature = "tracing")]
            tracing::debug!(
                window = i,
                from = %iso(window_start),
                to = %iso(window_end),
                "fetching window"
            );
            let raw = self.fetch_window(&params).await?;
            report.windows_fetched += 1;

            let records = self.normalizer.normalize(&raw, self.engine.clock.now_ms())?;
            if i == 0 && phase == SyncPhase::Initial {
                self.check_first_window(window_start, &records)?;
            }
            if records.is_empty() {
                continue;
            }
            let count = records.len() as u64;
            store.write_batch(series, records).await?;
            report.records_written += count;
        }
        Ok(report)
    }

    async fn fetch_window(&self, params: &FetchParams) -> Result<Vec<RawRecord>, SyncError> {
        let endpoint = &self.job.endpoint;
        let mut parts = Vec::with_capacity(endpoint.paths.len());
        for path in &endpoint.paths {
            parts.push(self.adapter.fetch(path, params).await?);
        }
        match endpoint.mode {
            EndpointMode::Concat => Ok(parts.into_iter().flatten().collect()),
            EndpointMode::MergeDict => merge_keyed(parts),
        }
    }

    /// The first window of the initial phase must return data that starts near
    /// the requested start; otherwise the symbol is wrong or was not listed yet.
    /// The resume phase chases the live edge and is not checked.
    ///
    /// "Near" means strictly closer than the profile tolerance, or no further
    /// than one bin for cadences coarser than that.
    fn check_first_window(
        &self,
        window_start: i64,
        records: &[CanonicalRecord],
    ) -> Result<(), SyncError> {
        let series = &self.job.series;
        let Some(first) = records.first() else {
            return Err(SyncError::sanity(format!(
                "no records from the start of the requested range ({}); did {} exist on {} at that time?",
                iso(window_start),
                series.symbol,
                series.exchange
            )));
        };
        if !self.normalizer.layout().has_record_time() {
            return Ok(());
        }
        let tolerance_ms = self.engine.profile.first_record_tolerance.as_millis();
        let bin_ms = u128::from(self.planner.cadence().bin_ms().unsigned_abs());
        let distance = (i128::from(first.time_ms) - i128::from(window_start)).unsigned_abs();
        if distance >= tolerance_ms && distance > bin_ms {
            return Err(SyncError::sanity(format!(
                "first record at {} is {}s from the requested start {} (limit {}s); did {} exist on {} at that time?",
                iso(first.time_ms),
                distance / 1_000,
                iso(window_start),
                tolerance_ms.max(bin_ms) / 1_000,
                series.symbol,
                series.exchange
            )));
        }
        Ok(())
    }

    #[cfg_attr(not(feature = "tracing"), allow(clippy::unused_self))]
    fn transition(&self, state: &mut SyncState, next: SyncState) {
        #[cfg(feature = "tracing")]
        tracing::debug!(series = %self.job.series, from = ?state, to = ?next, "state");
        *state = next;
    }

    fn fail(&self, error: SyncError, phase: SyncPhase, state: &mut SyncState) -> SyncError {
        self.transition(state, SyncState::Error);
        let error = error.in_phase(&self.job.series, phase);
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %error, "sync failed");
        error
    }
}

/// Merge the keyed records of every sub-endpoint into one record; later keys win.
fn merge_keyed(parts: Vec<Vec<RawRecord>>) -> Result<Vec<RawRecord>, SyncError> {
    let mut merged = Map::new();
    let mut seen = false;
    for record in parts.into_iter().flatten() {
        match record {
            RawRecord::Keyed(map) => {
                merged.extend(map);
                seen = true;
            }
            RawRecord::Positional(_) => {
                return Err(SyncError::data(
                    "positional record cannot be merged by key",
                ));
            }
        }
    }
    Ok(if seen {
        vec![RawRecord::Keyed(merged)]
    } else {
        Vec::new()
    })
}
