//! Immutable description of where values live in an exchange's raw records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ExchangeId, SyncError};

/// Location of the six OHLCV columns (timestamp included).
///
/// `T` is `usize` for positional records and `String` for keyed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcvColumns<T> {
    /// Timestamp column.
    pub time: T,
    /// Open price column.
    pub open: T,
    /// High price column.
    pub high: T,
    /// Low price column.
    pub low: T,
    /// Close price column.
    pub close: T,
    /// Volume column.
    pub volume: T,
}

impl<T> OhlcvColumns<T> {
    fn named(&self) -> [(&'static str, &T); 6] {
        [
            ("time", &self.time),
            ("open", &self.open),
            ("high", &self.high),
            ("low", &self.low),
            ("close", &self.close),
            ("volume", &self.volume),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum LayoutKind {
    Positional(OhlcvColumns<usize>),
    Keyed(OhlcvColumns<String>),
    Dynamic {
        time_field: Option<String>,
        tag_deny_list: BTreeSet<String>,
    },
}

/// Field layout declared by an adapter, validated once at construction.
///
/// OHLCV layouts (`positional`, `keyed`) map the canonical candle fields to
/// exchange columns and carry the price invariants. `dynamic` layouts are for
/// wide series: every numeric value becomes a field and every string/boolean
/// value becomes a tag, except for deny-listed names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub(crate) kind: LayoutKind,
}

impl FieldLayout {
    /// Layout for array-shaped candles.
    ///
    /// # Errors
    /// Returns `InvalidLayout` if two canonical fields share a column index.
    pub fn positional(columns: OhlcvColumns<usize>) -> Result<Self, SyncError> {
        let mut seen = BTreeSet::new();
        for (name, idx) in columns.named() {
            if !seen.insert(*idx) {
                return Err(SyncError::InvalidLayout(format!(
                    "column {idx} mapped twice (at '{name}')"
                )));
            }
        }
        Ok(Self {
            kind: LayoutKind::Positional(columns),
        })
    }

    /// Layout for object-shaped candles.
    ///
    /// # Errors
    /// Returns `InvalidLayout` for empty or duplicated key names.
    pub fn keyed(columns: OhlcvColumns<String>) -> Result<Self, SyncError> {
        let mut seen = BTreeSet::new();
        for (name, key) in columns.named() {
            if key.trim().is_empty() {
                return Err(SyncError::InvalidLayout(format!("empty key for '{name}'")));
            }
            if !seen.insert(key.as_str()) {
                return Err(SyncError::InvalidLayout(format!(
                    "key '{key}' mapped twice (at '{name}')"
                )));
            }
        }
        Ok(Self {
            kind: LayoutKind::Keyed(columns),
        })
    }

    /// Layout for wide, non-OHLCV series.
    ///
    /// Without `time_field`, records are stamped with the top of the current
    /// UTC hour. The time field is never turned into a tag.
    ///
    /// # Errors
    /// Returns `InvalidLayout` for an empty time field name.
    pub fn dynamic<I, S>(time_field: Option<&str>, tag_deny_list: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if time_field.is_some_and(|t| t.trim().is_empty()) {
            return Err(SyncError::InvalidLayout("empty time field name".into()));
        }
        let mut deny: BTreeSet<String> = tag_deny_list.into_iter().map(Into::into).collect();
        if let Some(t) = time_field {
            deny.insert(t.to_string());
        }
        Ok(Self {
            kind: LayoutKind::Dynamic {
                time_field: time_field.map(str::to_string),
                tag_deny_list: deny,
            },
        })
    }

    /// Candle layout used by each supported exchange.
    #[must_use]
    pub fn candles_for(exchange: ExchangeId) -> Self {
        let columns = match exchange {
            // [open time, open, high, low, close, volume, close time, ...]
            ExchangeId::Binance | ExchangeId::Ftx => OhlcvColumns {
                time: 0,
                open: 1,
                high: 2,
                low: 3,
                close: 4,
                volume: 5,
            },
            // [mts, open, close, high, low, volume]
            ExchangeId::Bitfinex => OhlcvColumns {
                time: 0,
                open: 1,
                close: 2,
                high: 3,
                low: 4,
                volume: 5,
            },
        };
        Self {
            kind: LayoutKind::Positional(columns),
        }
    }

    /// True when records carry the OHLCV price invariants.
    #[must_use]
    pub const fn is_ohlcv(&self) -> bool {
        !matches!(self.kind, LayoutKind::Dynamic { .. })
    }

    /// False when records carry no timestamp and are stamped at normalization time.
    #[must_use]
    pub const fn has_record_time(&self) -> bool {
        !matches!(
            self.kind,
            LayoutKind::Dynamic {
                time_field: None,
                ..
            }
        )
    }

    /// Name of the timestamp field of a dynamic layout.
    #[must_use]
    pub fn time_field(&self) -> Option<&str> {
        match &self.kind {
            LayoutKind::Dynamic { time_field, .. } => time_field.as_deref(),
            LayoutKind::Keyed(cols) => Some(cols.time.as_str()),
            LayoutKind::Positional(_) => None,
        }
    }
}
