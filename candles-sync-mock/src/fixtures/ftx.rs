use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use candles_sync_core::RawRecord;

const HOUR_MS: i64 = 3_600_000;

fn rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_default()
}

fn record(value: serde_json::Value) -> RawRecord {
    match value {
        serde_json::Value::Object(map) => RawRecord::Keyed(map),
        other => RawRecord::Positional(vec![other]),
    }
}

/// Hourly FTX funding rates for `future` in `(start, end]`, ISO-8601 `time`.
#[must_use]
pub fn funding_rates(future: &str, start: i64, end: i64) -> Vec<RawRecord> {
    super::close_times(start, end, HOUR_MS)
        .map(|t| {
            let rate = ((t / HOUR_MS).rem_euclid(7) as f64 - 3.0) * 1e-6;
            record(json!({
                "future": future,
                "rate": rate,
                "time": rfc3339(t),
            }))
        })
        .collect()
}

/// FTX `futures/<name>` payload.
#[must_use]
pub fn future_info(name: &str) -> RawRecord {
    record(json!({
        "name": name,
        "underlying": name.split('-').next().unwrap_or(name),
        "type": "perpetual",
        "perpetual": true,
        "expired": false,
        "last": 47_012.0,
        "index": 47_020.5,
        "mark": 47_012.0,
        "change1h": 0.001,
        "change24h": -0.012,
        "volumeUsd24h": 1_523_456_789.0,
        "volume": 32_401.5,
        "openInterest": 51_234.2,
    }))
}

/// FTX `futures/<name>/stats` payload; `volume` collides with the info payload.
#[must_use]
pub fn future_stats(next_funding_ms: i64) -> RawRecord {
    record(json!({
        "volume": 32_555.1,
        "nextFundingRate": 0.000_012,
        "nextFundingTime": rfc3339(next_funding_ms),
        "openInterest": 51_300.7,
    }))
}
