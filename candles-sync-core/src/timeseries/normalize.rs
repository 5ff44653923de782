use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde_json::{Map, Value};

use candles_sync_types::{SeriesKey, SyncError};

use crate::layout::{FieldLayout, LayoutKind, OhlcvColumns};
use crate::types::{CanonicalRecord, RawRecord, TimestampUnit};

/// Tags the engine always sets from the series key.
pub const RESERVED_TAGS: [&str; 2] = ["symbol", "interval"];

/// Turns raw exchange records into validated canonical records for one series.
///
/// Built once per series run; tag collisions are configuration errors raised
/// here, before any record is seen.
#[derive(Debug, Clone)]
pub struct Normalizer {
    layout: FieldLayout,
    unit: TimestampUnit,
    measurement: String,
    tags: BTreeMap<String, String>,
}

impl Normalizer {
    /// Build a normalizer for `series`.
    ///
    /// Every record is tagged with `symbol`, `interval`, the series
    /// dimensions and `extra_tags`.
    ///
    /// # Errors
    /// Returns `ReservedTag` when `extra_tags` redefines `symbol`, `interval`
    /// or one of the series dimensions.
    pub fn new(
        layout: FieldLayout,
        unit: TimestampUnit,
        series: &SeriesKey,
        extra_tags: &BTreeMap<String, String>,
    ) -> Result<Self, SyncError> {
        let mut tags = BTreeMap::new();
        tags.insert("symbol".to_string(), series.symbol.clone());
        tags.insert("interval".to_string(), series.interval.to_string());
        for (name, value) in &series.dimensions {
            if RESERVED_TAGS.contains(&name.as_str()) {
                return Err(SyncError::ReservedTag { tag: name.clone() });
            }
            tags.insert(name.clone(), value.clone());
        }
        for (name, value) in extra_tags {
            if tags.contains_key(name) {
                return Err(SyncError::ReservedTag { tag: name.clone() });
            }
            tags.insert(name.clone(), value.clone());
        }
        Ok(Self {
            layout,
            unit,
            measurement: series.measurement(),
            tags,
        })
    }

    /// Measurement every record is written under.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Tags stamped on every record.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// The layout records are read with.
    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Normalize a whole batch.
    ///
    /// `now_ms` stamps dynamic records that carry no time field (truncated to
    /// the top of its UTC hour).
    ///
    /// # Errors
    /// Returns `DataIntegrity` for the first record that cannot be read or
    /// violates the OHLCV invariants; nothing of the batch is returned then.
    pub fn normalize(
        &self,
        raw: &[RawRecord],
        now_ms: i64,
    ) -> Result<Vec<CanonicalRecord>, SyncError> {
        raw.iter()
            .enumerate()
            .map(|(i, record)| {
                self.normalize_one(record, now_ms)
                    .map_err(|e| SyncError::data(format!("record {i}: {}", detail(&e))))
            })
            .collect()
    }

    fn normalize_one(&self, raw: &RawRecord, now_ms: i64) -> Result<CanonicalRecord, SyncError> {
        let (time_ms, fields, record_tags) = match (&self.layout.kind, raw) {
            (LayoutKind::Positional(cols), RawRecord::Positional(values)) => {
                let get = |idx: &usize| values.get(*idx);
                let (t, f) = self.read_ohlcv(cols, get)?;
                (t, f, BTreeMap::new())
            }
            (LayoutKind::Keyed(cols), RawRecord::Keyed(map)) => {
                let get = |key: &String| map.get(key.as_str());
                let (t, f) = self.read_ohlcv(cols, get)?;
                (t, f, BTreeMap::new())
            }
            (
                LayoutKind::Dynamic {
                    time_field,
                    tag_deny_list,
                },
                RawRecord::Keyed(map),
            ) => self.read_dynamic(map, time_field.as_deref(), tag_deny_list, now_ms)?,
            (_, other) => {
                return Err(SyncError::data(format!(
                    "{} record does not match the declared layout",
                    other.shape()
                )));
            }
        };
        if time_ms < 0 {
            return Err(SyncError::data(format!("negative timestamp {time_ms}")));
        }
        let mut tags = record_tags;
        tags.extend(self.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(CanonicalRecord {
            measurement: self.measurement.clone(),
            tags,
            time_ms,
            fields,
        })
    }

    fn read_ohlcv<'a, T, F>(
        &self,
        cols: &OhlcvColumns<T>,
        get: F,
    ) -> Result<(i64, BTreeMap<String, f64>), SyncError>
    where
        T: core::fmt::Debug,
        F: Fn(&T) -> Option<&'a Value>,
    {
        let column = |name: &str, at: &T| {
            get(at).ok_or_else(|| SyncError::data(format!("missing '{name}' at {at:?}")))
        };
        let time_ms = self.unit.parse_millis(column("time", &cols.time)?)?;
        let open = number("open", column("open", &cols.open)?)?;
        let high = number("high", column("high", &cols.high)?)?;
        let low = number("low", column("low", &cols.low)?)?;
        let close = number("close", column("close", &cols.close)?)?;
        let volume = number("volume", column("volume", &cols.volume)?)?;
        if low > high {
            return Err(SyncError::data(format!("low {low} above high {high}")));
        }
        if low > close {
            return Err(SyncError::data(format!("low {low} above close {close}")));
        }
        if high < open {
            return Err(SyncError::data(format!("high {high} below open {open}")));
        }
        let fields = BTreeMap::from([
            ("open".to_string(), open),
            ("high".to_string(), high),
            ("low".to_string(), low),
            ("close".to_string(), close),
            ("volume".to_string(), volume),
        ]);
        Ok((time_ms, fields))
    }

    fn read_dynamic(
        &self,
        map: &Map<String, Value>,
        time_field: Option<&str>,
        deny: &BTreeSet<String>,
        now_ms: i64,
    ) -> Result<(i64, BTreeMap<String, f64>, BTreeMap<String, String>), SyncError> {
        let time_ms = match time_field {
            Some(name) => {
                let value = map
                    .get(name)
                    .ok_or_else(|| SyncError::data(format!("missing time field '{name}'")))?;
                self.unit.parse_millis(value)?
            }
            None => top_of_hour(now_ms)?,
        };
        let mut fields = BTreeMap::new();
        let mut tags = BTreeMap::new();
        for (name, value) in map {
            if time_field == Some(name.as_str()) {
                continue;
            }
            match value {
                Value::Number(_) => {
                    fields.insert(name.clone(), number(name, value)?);
                }
                Value::String(s) if !deny.contains(name) => {
                    tags.insert(name.clone(), s.clone());
                }
                Value::Bool(b) if !deny.contains(name) => {
                    tags.insert(name.clone(), b.to_string());
                }
                _ => {}
            }
        }
        if fields.is_empty() {
            return Err(SyncError::data("record has no numeric fields"));
        }
        Ok((time_ms, fields, tags))
    }
}

fn number(name: &str, value: &Value) -> Result<f64, SyncError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| SyncError::data(format!("'{name}' is not a finite number: {value}")))
}

fn top_of_hour(now_ms: i64) -> Result<i64, SyncError> {
    let now = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .ok_or_else(|| SyncError::data(format!("clock out of range: {now_ms}")))?;
    now.duration_trunc(TimeDelta::hours(1))
        .map(|t| t.timestamp_millis())
        .map_err(|e| SyncError::data(e.to_string()))
}

fn detail(err: &SyncError) -> String {
    match err {
        SyncError::DataIntegrity(msg) => msg.clone(),
        other => other.to_string(),
    }
}
