use candles_sync_core::RawRecord;
use serde_json::{Value, json};

fn prices(t: i64, bin_ms: i64) -> (f64, f64, f64, f64, f64) {
    let p = 100.0 + (t / bin_ms.max(1)).rem_euclid(50) as f64;
    // open, high, low, close, volume
    (p, p + 2.0, p - 1.0, p + 1.0, 10.0 + (p - 100.0) / 10.0)
}

/// One Binance kline: `[open time, "open", "high", "low", "close", "volume", close time, ...]`.
#[must_use]
pub fn binance_kline(t: i64, bin_ms: i64) -> RawRecord {
    let (o, h, l, c, v) = prices(t, bin_ms);
    RawRecord::Positional(vec![
        json!(t),
        json!(format!("{o:.2}")),
        json!(format!("{h:.2}")),
        json!(format!("{l:.2}")),
        json!(format!("{c:.2}")),
        json!(format!("{v:.5}")),
        json!(t + bin_ms - 1),
        json!(format!("{:.2}", v * c)),
        json!(42),
        json!("0"),
        json!("0"),
        json!("0"),
    ])
}

/// Binance klines covering `(start, end]`.
#[must_use]
pub fn binance_klines(start: i64, end: i64, bin_ms: i64) -> Vec<RawRecord> {
    super::close_times(start, end, bin_ms)
        .map(|t| binance_kline(t, bin_ms))
        .collect()
}

/// One Bitfinex candle: `[mts, open, close, high, low, volume]`.
#[must_use]
pub fn bitfinex_candle(t: i64, bin_ms: i64) -> RawRecord {
    let (o, h, l, c, v) = prices(t, bin_ms);
    RawRecord::Positional(vec![
        json!(t),
        json!(o),
        json!(c),
        json!(h),
        json!(l),
        json!(v),
    ])
}

/// Bitfinex candles covering `(start, end]`.
#[must_use]
pub fn bitfinex_candles(start: i64, end: i64, bin_ms: i64) -> Vec<RawRecord> {
    super::close_times(start, end, bin_ms)
        .map(|t| bitfinex_candle(t, bin_ms))
        .collect()
}

/// A Binance-shaped kline whose low is above its high.
#[must_use]
pub fn inverted_binance_kline(t: i64) -> RawRecord {
    RawRecord::Positional(vec![
        json!(t),
        Value::from("100.0"),
        Value::from("101.0"),
        Value::from("105.0"),
        Value::from("100.5"),
        Value::from("1.0"),
    ])
}
