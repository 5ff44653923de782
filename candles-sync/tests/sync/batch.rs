use std::sync::Arc;

use crate::helpers::*;
use candles_sync::{DataType, ExchangeId, SyncError, SyncRequest};
use candles_sync_core::FetchParams;
use candles_sync_mock::fixtures::{self, candles};
use candles_sync_mock::{MemoryStore, MockBehavior};

/// Klines for every symbol except `LATECOIN`, which was not listed yet, and
/// `BROKEN`, whose endpoint is down.
fn per_symbol_klines() -> MockBehavior {
    let format = format(ExchangeId::Binance, DataType::Candles);
    MockBehavior::Generate(Arc::new(move |_endpoint: &str, params: &FetchParams| {
        match params.get("symbol").map(String::as_str) {
            Some("LATECOIN") => Ok(Vec::new()),
            Some("BROKEN") => Err(SyncError::transport("binance", "HTTP 500")),
            _ => {
                let (s, e) = fixtures::window_ms(&format, params)
                    .ok_or_else(|| SyncError::transport("binance", "no window"))?;
                Ok(candles::binance_klines(s, e, MINUTE))
            }
        }
    }))
}

fn request(symbol: &str) -> SyncRequest {
    SyncRequest::candles(ExchangeId::Binance, symbol, interval("1m")).range(T0, T0 + HOUR)
}

#[tokio::test]
async fn sync_many_keeps_request_order() {
    let (binance, ctl) = binance(MINUTE).await;
    ctl.set_behavior("klines", per_symbol_klines()).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let requests = [request("BTCUSDT"), request("LATECOIN"), request("ETHUSDT")];
    let results = engine.sync_many(&requests).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap()[0].series.symbol, "BTCUSDT");
    assert!(results[1].as_ref().unwrap_err().is_missing_history());
    assert_eq!(results[2].as_ref().unwrap()[0].series.symbol, "ETHUSDT");
    assert_eq!(ctl.call_count().await, 3);
}

#[tokio::test]
async fn duplicate_requests_in_a_batch_are_rejected() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let requests = [
        request("BTCUSDT"),
        request("BTCUSDT").range(T0 - HOUR, T0),
    ];
    let results = engine.sync_many(&requests).await;

    assert_eq!(results[0].as_ref().unwrap()[0].records_written(), 60);
    match &results[1] {
        Err(SyncError::InvalidArg(msg)) => assert!(msg.contains("duplicate"), "{msg}"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(ctl.call_count().await, 1);
}

#[tokio::test]
async fn sync_all_skips_unlisted_assets_and_reports_failures() {
    let (binance, ctl) = binance(MINUTE).await;
    ctl.set_behavior("klines", per_symbol_klines()).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let requests = [
        request("BTCUSDT"),
        request("LATECOIN"),
        request("BROKEN"),
        request("ETHUSDT"),
    ];
    let report = engine.sync_all(&requests).await;

    assert!(!report.is_success());
    let completed: Vec<&str> = report
        .completed
        .iter()
        .map(|r| r.series.symbol.as_str())
        .collect();
    assert_eq!(completed, ["BTCUSDT", "ETHUSDT"]);

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0.symbol, "LATECOIN");
    assert!(matches!(report.skipped[0].1.root(), SyncError::SanityCheck { .. }));

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.symbol, "BROKEN");
    assert!(matches!(report.failed[0].1.root(), SyncError::Transport { .. }));
}

#[tokio::test]
async fn sync_all_without_failures_is_a_success() {
    let (binance, _ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let report = engine
        .sync_all(&[request("BTCUSDT"), request("ETHUSDT")])
        .await;

    assert!(report.is_success());
    assert_eq!(report.completed.len(), 2);
    assert!(report.skipped.is_empty());
}
