//! Deterministic payloads shaped like real exchange responses.

use std::sync::Arc;

use candles_sync_core::{FetchParams, RawRecord, RequestFormat, SyncError};

use crate::exchange::Generator;

pub mod candles;
pub mod ftx;

/// Window `[start, end]` of a request in milliseconds, read the way `format` wrote it.
#[must_use]
pub fn window_ms(format: &RequestFormat, params: &FetchParams) -> Option<(i64, i64)> {
    let read = |name: &str| -> Option<i64> {
        let raw: f64 = params.get(name)?.parse().ok()?;
        Some(format.unit.to_millis(raw).round() as i64)
    };
    Some((read(&format.start_param)?, read(&format.end_param)?))
}

/// Generator answering each call with `make(start_ms, end_ms)` of its window.
pub fn windowed<F>(format: RequestFormat, make: F) -> Generator
where
    F: Fn(i64, i64) -> Vec<RawRecord> + Send + Sync + 'static,
{
    Arc::new(move |endpoint: &str, params: &FetchParams| {
        let (start, end) = window_ms(&format, params).ok_or_else(|| {
            SyncError::transport(
                "candles-sync-mock",
                format!("request to '{endpoint}' has no window: {params:?}"),
            )
        })?;
        Ok(make(start, end))
    })
}

/// Bin-aligned timestamps in `(start, end]`.
///
/// Synthetic records are stamped at the close of their bin, so a full
/// window `[start, end]` ends exactly at `end`.
pub fn close_times(start: i64, end: i64, bin_ms: i64) -> impl Iterator<Item = i64> {
    let bin = bin_ms.max(1);
    let first = (start.div_euclid(bin) + 1) * bin;
    (0..)
        .map(move |i| first + i * bin)
        .take_while(move |t| *t <= end)
}
