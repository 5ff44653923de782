use std::sync::Arc;
use std::time::Duration;

use crate::helpers::*;
use candles_sync::{ExchangeId, RuntimeProfile, SyncEngine, SyncError, SyncPhase, SyncRequest};
use candles_sync_mock::{MemoryStore, MockBehavior};

#[tokio::test]
async fn transport_errors_carry_series_and_phase() {
    let (binance, ctl) = binance(MINUTE).await;
    let original = SyncError::transport("binance", "HTTP 503 Service Unavailable");
    ctl.set_behavior("klines", MockBehavior::Fail(original.clone())).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0, T0 + HOUR);
    let err = engine.sync(&req).await.unwrap_err();

    assert!(
        err.to_string()
            .starts_with("binance:BTCUSDT:1m:candles [initial]: "),
        "{err}"
    );
    assert_eq!(err.root(), &original);
    match err {
        SyncError::Phase { phase, .. } => assert_eq!(phase, SyncPhase::Initial),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn batches_written_before_a_failure_are_kept() {
    let (binance, ctl) = binance(MINUTE).await;
    ctl.push_behavior("klines", binance_klines(MINUTE)).await;
    ctl.push_behavior("klines", binance_klines(MINUTE)).await;
    ctl.set_behavior(
        "klines",
        MockBehavior::Fail(SyncError::transport("binance", "connection reset")),
    )
    .await;
    let store = MemoryStore::new();
    let clock = clock(T0 + 2_500 * MINUTE);
    let engine = engine(&[binance], &store, &clock);
    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
        .range(T0, T0 + 2_500 * MINUTE);

    let err = engine.sync(&req).await.unwrap_err();
    assert!(matches!(err.root(), SyncError::Transport { .. }));
    assert_eq!(ctl.call_count().await, 3);
    assert_eq!(store.write_calls().await.len(), 2);

    // the rerun picks up from the last stored record
    ctl.set_behavior("klines", binance_klines(MINUTE)).await;
    ctl.clear_calls().await;
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].params["startTime"], (T0 + 1_666 * MINUTE).to_string());
    assert_eq!(reports[0].records_written(), 834);
    assert_eq!(store.records(&reports[0].series).await.len(), 2_500);
}

#[tokio::test]
async fn store_failures_abort_the_run() {
    let (binance, _ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    store.fail_writes(Some("disk full")).await;
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0, T0 + HOUR);
    let err = engine.sync(&req).await.unwrap_err();

    assert_eq!(err.root(), &SyncError::Store("disk full".into()));
}

#[tokio::test(start_paused = true)]
async fn stalled_calls_time_out() {
    let (binance, ctl) = binance(MINUTE).await;
    ctl.set_behavior("klines", MockBehavior::Hang).await;
    let store = MemoryStore::new();
    let engine = SyncEngine::builder()
        .with_adapter(binance)
        .store(Arc::new(store.clone()))
        .clock(clock(T0 + HOUR))
        .profile(RuntimeProfile::testing())
        .call_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0, T0 + HOUR);
    let err = engine.sync(&req).await.unwrap_err();

    match err.root() {
        SyncError::Transport { msg, .. } => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.write_calls().await.is_empty());
}
