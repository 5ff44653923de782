//! Record, watermark and endpoint types.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Query parameters of one exchange request.
pub type FetchParams = BTreeMap<String, String>;

/// Canonical, store-ready record.
///
/// Serializes as `{measurement, tags, time_ms, fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Measurement name, e.g. `candles_1m`.
    pub measurement: String,
    /// Indexed dimensions (`symbol`, `interval`, series dimensions, extra tags).
    pub tags: BTreeMap<String, String>,
    /// Milliseconds since the epoch.
    pub time_ms: i64,
    /// Numeric measurement values.
    pub fields: BTreeMap<String, f64>,
}

impl CanonicalRecord {
    /// Look up a numeric field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// Look up a tag.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// Exchange-specific record shape, consumed immediately by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    /// Ordered columns (e.g. Binance klines, Bitfinex candles).
    Positional(Vec<serde_json::Value>),
    /// Named fields (e.g. FTX funding rates).
    Keyed(serde_json::Map<String, serde_json::Value>),
}

impl RawRecord {
    /// Convert one decoded JSON value into a raw record.
    ///
    /// # Errors
    /// Returns `DataIntegrity` for scalars, which are not records.
    pub fn from_json(value: serde_json::Value) -> Result<Self, SyncError> {
        match value {
            serde_json::Value::Array(cols) => Ok(Self::Positional(cols)),
            serde_json::Value::Object(map) => Ok(Self::Keyed(map)),
            other => Err(SyncError::data(format!("not a record: {other}"))),
        }
    }

    /// Shape label for error messages.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Positional(_) => "positional",
            Self::Keyed(_) => "keyed",
        }
    }
}

/// Earliest and latest timestamps stored for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Watermark {
    /// Oldest stored timestamp (ms).
    pub earliest: Option<i64>,
    /// Newest stored timestamp (ms).
    pub latest: Option<i64>,
}

impl Watermark {
    /// Watermark of a series without data.
    pub const EMPTY: Self = Self {
        earliest: None,
        latest: None,
    };

    /// Watermark spanning `[earliest, latest]`.
    #[must_use]
    pub const fn new(earliest: i64, latest: i64) -> Self {
        Self {
            earliest: Some(earliest),
            latest: Some(latest),
        }
    }

    /// True when the series has no data yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}

/// Unit an exchange uses for timestamps, in requests or in records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimestampUnit {
    /// Seconds since the epoch.
    Seconds,
    /// Milliseconds since the epoch.
    #[default]
    Millis,
    /// Microseconds since the epoch.
    Micros,
}

impl TimestampUnit {
    /// Convert a value expressed in this unit to milliseconds.
    #[must_use]
    pub fn to_millis(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value * 1_000.0,
            Self::Millis => value,
            Self::Micros => value / 1_000.0,
        }
    }

    /// Express a millisecond timestamp in this unit (seconds truncate toward negative infinity).
    #[must_use]
    pub const fn from_millis(self, ms: i64) -> i64 {
        match self {
            Self::Seconds => ms.div_euclid(1_000),
            Self::Millis => ms,
            Self::Micros => ms.saturating_mul(1_000),
        }
    }

    /// Parse a JSON timestamp value into milliseconds.
    ///
    /// Numbers and numeric strings are read in this unit; other strings must
    /// be RFC 3339 date-times.
    ///
    /// # Errors
    /// Returns `DataIntegrity` when the value is not a timestamp.
    pub fn parse_millis(self, value: &serde_json::Value) -> Result<i64, SyncError> {
        let raw = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => match s.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    return DateTime::parse_from_rfc3339(s.trim())
                        .map(|dt| dt.timestamp_millis())
                        .map_err(|_| SyncError::data(format!("unparseable timestamp '{s}'")));
                }
            },
            _ => None,
        };
        let raw = raw
            .filter(|v| v.is_finite())
            .ok_or_else(|| SyncError::data(format!("unparseable timestamp {value}")))?;
        Ok(self.to_millis(raw).round() as i64)
    }
}

/// How the results of a multi-endpoint request are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndpointMode {
    /// Concatenate the record lists of every sub-endpoint.
    #[default]
    Concat,
    /// Merge keyed records of every sub-endpoint into one record; later
    /// endpoints overwrite same-named keys of earlier ones.
    MergeDict,
}

/// One logical endpoint, possibly assembled from several sub-endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Sub-endpoint paths, called in order for each window.
    pub paths: Vec<String>,
    /// How the sub-endpoint results combine.
    pub mode: EndpointMode,
}

impl EndpointDescriptor {
    /// A single endpoint.
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            mode: EndpointMode::Concat,
        }
    }

    /// Several endpoints whose record lists are concatenated.
    #[must_use]
    pub fn concat(paths: Vec<String>) -> Self {
        Self {
            paths,
            mode: EndpointMode::Concat,
        }
    }

    /// Several endpoints merged into one keyed record.
    #[must_use]
    pub fn merged(paths: Vec<String>) -> Self {
        Self {
            paths,
            mode: EndpointMode::MergeDict,
        }
    }
}
