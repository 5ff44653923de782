//! Sync strategies for every supported exchange and data type.
//!
//! A [`SyncStrategy`] declares how one exchange serves one kind of series:
//! request parameter names and units, page size, call budget, record layout
//! and the endpoints to call. [`SyncStrategy::jobs`] expands a symbol into
//! the concrete series to sync (one, or one per funding period on Bitfinex).

use std::collections::BTreeMap;

use candles_sync_core::{
    DataType, EndpointDescriptor, ExchangeId, ExchangeLimits, FetchParams, FieldLayout, Interval,
    RequestFormat, SeriesKey, SyncError, TimestampUnit,
};

/// Funding periods Bitfinex publishes candles for, in days.
const BITFINEX_FUNDING_PERIODS: std::ops::RangeInclusive<u32> = 2..=30;

const DEFAULT_SYNC_DAYS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    BinanceKlines,
    BitfinexCandles,
    FtxFundingRates,
    FtxFutures,
}

/// How one exchange serves one data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStrategy {
    /// Exchange served.
    pub exchange: ExchangeId,
    /// Data type served.
    pub data_type: DataType,
    /// Page size, call budget and default window.
    pub limits: ExchangeLimits,
    /// Names and unit of the window parameters.
    pub request: RequestFormat,
    /// Record layout; `None` uses the adapter's candle layout.
    pub layout: Option<FieldLayout>,
    /// Unit of numeric timestamps inside records.
    pub record_unit: TimestampUnit,
    /// Interval the exchange only offers for this data type, overriding the request.
    pub forced_interval: Option<&'static str>,
    route: Route,
}

/// One concrete series to sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    /// Series identity (and storage partition).
    pub series: SeriesKey,
    /// Endpoint(s) called for every window.
    pub endpoint: EndpointDescriptor,
    /// Parameters the strategy adds to every request.
    pub params: FetchParams,
    /// Tags the strategy adds to every record.
    pub tags: BTreeMap<String, String>,
}

fn pairs<const N: usize>(items: [(&str, &str); N]) -> BTreeMap<String, String> {
    items
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl SyncStrategy {
    /// Interval actually synced for a requested one.
    ///
    /// # Errors
    /// Returns `InvalidArg` if a forced interval label is malformed.
    pub fn effective_interval(&self, requested: &Interval) -> Result<Interval, SyncError> {
        match self.forced_interval {
            Some(label) => Interval::parse(label),
            None => Ok(requested.clone()),
        }
    }

    /// Series to sync for `symbol`.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty symbol, or a Bitfinex symbol that is
    /// neither a trading (`t…`) nor a funding (`f…`) symbol.
    pub fn jobs(&self, symbol: &str, interval: &Interval) -> Result<Vec<SyncJob>, SyncError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SyncError::InvalidArg("symbol must not be empty".into()));
        }
        let interval = self.effective_interval(interval)?;
        let series = SeriesKey::new(self.exchange, symbol, interval.clone(), self.data_type);

        let jobs = match self.route {
            Route::BinanceKlines => vec![SyncJob {
                series,
                endpoint: EndpointDescriptor::single("klines"),
                params: pairs([("interval", interval.as_str()), ("symbol", symbol)]),
                tags: BTreeMap::new(),
            }],
            Route::BitfinexCandles => bitfinex_jobs(series, symbol, &interval)?,
            Route::FtxFundingRates => vec![SyncJob {
                series,
                endpoint: EndpointDescriptor::single("funding_rates"),
                params: pairs([("future", symbol)]),
                tags: pairs([("source", "ftx")]),
            }],
            Route::FtxFutures => vec![SyncJob {
                series,
                endpoint: EndpointDescriptor::merged(vec![
                    format!("futures/{symbol}"),
                    format!("futures/{symbol}/stats"),
                ]),
                params: FetchParams::new(),
                tags: BTreeMap::new(),
            }],
        };
        Ok(jobs)
    }
}

fn bitfinex_jobs(
    series: SeriesKey,
    symbol: &str,
    interval: &Interval,
) -> Result<Vec<SyncJob>, SyncError> {
    if symbol.starts_with('t') {
        return Ok(vec![SyncJob {
            series,
            endpoint: EndpointDescriptor::single(format!("candles/trade:{interval}:{symbol}/hist")),
            // oldest first
            params: pairs([("sort", "1")]),
            tags: BTreeMap::new(),
        }]);
    }
    if symbol.starts_with('f') {
        return Ok(BITFINEX_FUNDING_PERIODS
            .map(|days| {
                let period = format!("p{days}");
                SyncJob {
                    endpoint: EndpointDescriptor::single(format!(
                        "candles/trade:{interval}:{symbol}:{period}/hist"
                    )),
                    series: series.clone().with_dimension("period", period),
                    params: FetchParams::new(),
                    tags: BTreeMap::new(),
                }
            })
            .collect());
    }
    Err(SyncError::InvalidArg(format!(
        "bitfinex symbols must start with 't' (trading) or 'f' (funding), got '{symbol}'"
    )))
}

/// Strategy for `exchange` and `data_type`.
///
/// # Errors
/// Returns `NoSuchAdapter` when the exchange does not serve that data type.
pub fn strategy_for(exchange: ExchangeId, data_type: DataType) -> Result<SyncStrategy, SyncError> {
    let strategy = match (exchange, data_type) {
        (ExchangeId::Binance, DataType::Candles) => SyncStrategy {
            exchange,
            data_type,
            limits: ExchangeLimits {
                max_batch_records: Some(1_000),
                calls_per_minute: 1_200,
                default_sync_days: DEFAULT_SYNC_DAYS,
            },
            request: RequestFormat::new("startTime", "endTime", TimestampUnit::Millis),
            layout: None,
            record_unit: TimestampUnit::Millis,
            forced_interval: None,
            route: Route::BinanceKlines,
        },
        (ExchangeId::Bitfinex, DataType::Candles) => SyncStrategy {
            exchange,
            data_type,
            limits: ExchangeLimits {
                max_batch_records: Some(10_000),
                calls_per_minute: 60,
                default_sync_days: DEFAULT_SYNC_DAYS,
            },
            request: RequestFormat::default(),
            layout: None,
            record_unit: TimestampUnit::Millis,
            forced_interval: None,
            route: Route::BitfinexCandles,
        },
        (ExchangeId::Ftx, DataType::FundingRates) => SyncStrategy {
            exchange,
            data_type,
            limits: ExchangeLimits {
                max_batch_records: Some(500),
                calls_per_minute: 30,
                default_sync_days: DEFAULT_SYNC_DAYS,
            },
            request: RequestFormat::new("start_time", "end_time", TimestampUnit::Seconds),
            layout: Some(FieldLayout::dynamic(Some("time"), ["future"])?),
            record_unit: TimestampUnit::Seconds,
            forced_interval: Some("1h"),
            route: Route::FtxFundingRates,
        },
        (ExchangeId::Ftx, DataType::Futures) => SyncStrategy {
            exchange,
            data_type,
            limits: ExchangeLimits {
                max_batch_records: None,
                calls_per_minute: 1_000,
                default_sync_days: DEFAULT_SYNC_DAYS,
            },
            request: RequestFormat::new("start_time", "end_time", TimestampUnit::Seconds),
            layout: Some(FieldLayout::dynamic(None, ["name", "underlying", "nextFundingTime"])?),
            record_unit: TimestampUnit::Seconds,
            forced_interval: Some("1h"),
            route: Route::FtxFutures,
        },
        _ => {
            return Err(SyncError::no_such_adapter(
                exchange.as_str(),
                data_type.as_str(),
            ));
        }
    };
    Ok(strategy)
}

/// Strategy looked up by exchange and data type names, e.g. `("binance", "candles")`.
///
/// # Errors
/// Returns `NoSuchAdapter` for unknown names as well as unsupported combinations.
pub fn strategy_by_name(exchange: &str, data_type: &str) -> Result<SyncStrategy, SyncError> {
    let no_such = || SyncError::no_such_adapter(exchange, data_type);
    let exchange_id: ExchangeId = exchange.parse().map_err(|_| no_such())?;
    let data_type_id: DataType = data_type.parse().map_err(|_| no_such())?;
    strategy_for(exchange_id, data_type_id)
}

/// Every strategy the catalog knows.
#[must_use]
pub fn strategies() -> Vec<SyncStrategy> {
    ExchangeId::ALL
        .into_iter()
        .flat_map(|e| DataType::ALL.into_iter().map(move |d| (e, d)))
        .filter_map(|(e, d)| strategy_for(e, d).ok())
        .collect()
}

/// Limits shared by every strategy of `exchange`: the tightest call budget
/// among them, since all its calls draw from one per-exchange limiter.
#[must_use]
pub fn exchange_limits(exchange: ExchangeId) -> ExchangeLimits {
    strategies()
        .into_iter()
        .filter(|s| s.exchange == exchange)
        .map(|s| s.limits)
        .min_by_key(|l| l.calls_per_minute)
        .unwrap_or_default()
}
