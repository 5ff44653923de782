//! Series identity: which exchange, which symbol, which cadence, which kind of data.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RuntimeProfile;
use crate::error::SyncError;

/// Exchanges the engine knows how to sync from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    /// Binance spot.
    Binance,
    /// Bitfinex trading and funding markets.
    Bitfinex,
    /// FTX derivatives.
    Ftx,
}

impl ExchangeId {
    /// All known exchanges.
    pub const ALL: [Self; 3] = [Self::Binance, Self::Bitfinex, Self::Ftx];

    /// Stable lowercase identifier, also used as the database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bitfinex => "bitfinex",
            Self::Ftx => "ftx",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| SyncError::InvalidArg(format!("unknown exchange '{s}'")))
    }
}

/// Kind of series being synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// OHLCV candles.
    Candles,
    /// Perpetual funding rates.
    FundingRates,
    /// Futures contract snapshots (info and stats).
    Futures,
}

impl DataType {
    /// All known data types.
    pub const ALL: [Self; 3] = [Self::Candles, Self::FundingRates, Self::Futures];

    /// Stable snake_case identifier, also the measurement prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candles => "candles",
            Self::FundingRates => "funding_rates",
            Self::Futures => "futures",
        }
    }

    /// True for series that carry the OHLCV price invariants.
    #[must_use]
    pub const fn is_ohlcv(self) -> bool {
        matches!(self, Self::Candles)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| SyncError::InvalidArg(format!("unknown data type '{s}'")))
    }
}

/// Exchange interval label such as `1m`, `4h`, `1D` or `1M`.
///
/// The label is kept verbatim (it names the measurement and is sent to the
/// exchange); the cadence in minutes is derived from it. Month intervals have
/// no fixed cadence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    label: String,
    minutes: Option<u32>,
}

impl Interval {
    /// Parse an interval label.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the label is not `<count><unit>` with unit one
    /// of `m`, `h`, `d`/`D`, `w`/`W` or `M`, or the count is zero.
    pub fn parse(label: &str) -> Result<Self, SyncError> {
        let invalid = || SyncError::InvalidArg(format!("invalid interval '{label}'"));
        let unit = label.chars().last().ok_or_else(invalid)?;
        let count: u32 = label[..label.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        let per_unit = match unit {
            'm' => Some(1),
            'h' => Some(60),
            'd' | 'D' => Some(1_440),
            'w' | 'W' => Some(10_080),
            'M' => None,
            _ => return Err(invalid()),
        };
        let minutes = match per_unit {
            Some(m) => Some(count.checked_mul(m).ok_or_else(invalid)?),
            None => None,
        };
        Ok(Self {
            label: label.to_string(),
            minutes,
        })
    }

    /// The label as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// Bin size in minutes, or `None` for calendar cadences without a fixed length.
    #[must_use]
    pub const fn minutes(&self) -> Option<u32> {
        self.minutes
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for Interval {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Interval {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.label
    }
}

/// Identifies one logical time series (one storage partition).
///
/// `dimensions` carry series-specific partitioning such as the Bitfinex
/// funding `period`; they take part in watermark lookups and become tags on
/// every written record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Source exchange.
    pub exchange: ExchangeId,
    /// Exchange symbol, verbatim.
    pub symbol: String,
    /// Series cadence.
    pub interval: Interval,
    /// Kind of data.
    pub data_type: DataType,
    /// Additional partitioning dimensions.
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl SeriesKey {
    /// Build a key without extra dimensions.
    pub fn new(
        exchange: ExchangeId,
        symbol: impl Into<String>,
        interval: Interval,
        data_type: DataType,
    ) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            interval,
            data_type,
            dimensions: BTreeMap::new(),
        }
    }

    /// Add a partitioning dimension.
    #[must_use]
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    /// Measurement name records of this series are written under, e.g. `candles_1m`.
    #[must_use]
    pub fn measurement(&self) -> String {
        format!("{}_{}", self.data_type.as_str(), self.interval)
    }

    /// Database holding this series under the given runtime profile.
    #[must_use]
    pub fn database(&self, profile: &RuntimeProfile) -> String {
        format!("{}{}", profile.namespace_prefix, self.exchange)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.exchange, self.symbol, self.interval, self.data_type
        )?;
        if !self.dimensions.is_empty() {
            let dims: Vec<String> = self
                .dimensions
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "{{{}}}", dims.join(","))?;
        }
        Ok(())
    }
}
