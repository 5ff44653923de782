use crate::helpers::*;
use candles_sync::{ExchangeId, SyncPhase, SyncRequest, SyncState};
use candles_sync_mock::MemoryStore;

#[tokio::test]
async fn first_run_fetches_the_whole_range_in_one_call() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0, T0 + HOUR);
    let reports = engine.sync(&req).await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.state, SyncState::Done);
    assert_eq!(report.records_written(), 60);
    assert_eq!(report.windows_fetched(), 1);
    assert_eq!(report.phases.len(), 1);
    assert_eq!(report.phases[0].phase, SyncPhase::Initial);

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "klines");
    let p = &calls[0].params;
    assert_eq!(p["startTime"], T0.to_string());
    assert_eq!(p["endTime"], (T0 + HOUR).to_string());
    assert_eq!(p["limit"], "1000");
    assert_eq!(p["symbol"], "BTCUSDT");
    assert_eq!(p["interval"], "1m");

    let stored = store.records(&report.series).await;
    assert_eq!(stored.len(), 60);
    let first = &stored[0];
    assert_eq!(first.measurement, "candles_1m");
    assert_eq!(first.time_ms, T0 + MINUTE);
    assert_eq!(first.tags.len(), 2);
    assert_eq!(first.tag("symbol"), Some("BTCUSDT"));
    assert_eq!(first.tag("interval"), Some("1m"));
    assert_eq!(first.field("open"), Some(121.0));
    assert_eq!(first.field("close"), Some(122.0));
    assert_eq!(stored.last().unwrap().time_ms, T0 + HOUR);
}

#[tokio::test]
async fn second_run_over_the_same_range_is_a_noop() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);
    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0, T0 + HOUR);

    engine.sync(&req).await.unwrap();
    ctl.clear_calls().await;
    let reports = engine.sync(&req).await.unwrap();

    assert_eq!(ctl.call_count().await, 0);
    assert!(reports[0].was_noop());
    assert_eq!(reports[0].records_written(), 0);
    assert_eq!(reports[0].state, SyncState::Done);
    assert_eq!(store.write_calls().await.len(), 1);
}

#[tokio::test]
async fn large_ranges_are_split_into_contiguous_windows() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + 2_500 * MINUTE);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
        .range(T0, T0 + 2_500 * MINUTE);
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].params["startTime"], T0.to_string());
    assert_eq!(calls[2].params["endTime"], (T0 + 2_500 * MINUTE).to_string());
    for pair in calls.windows(2) {
        assert_eq!(pair[0].params["endTime"], pair[1].params["startTime"]);
    }
    assert_eq!(reports[0].phases[0].plan.batch_count, 3);
    assert_eq!(reports[0].records_written(), 2_500);
    assert_eq!(store.records(&reports[0].series).await.len(), 2_500);
    assert_eq!(store.write_calls().await.len(), 3);
}

#[tokio::test]
async fn later_runs_append_from_the_latest_record() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);
    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).start(T0);

    engine.sync(&req).await.unwrap();
    ctl.clear_calls().await;
    clock.advance(30 * MINUTE);
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].params["startTime"], (T0 + HOUR).to_string());
    assert_eq!(calls[0].params["endTime"], (T0 + 90 * MINUTE).to_string());
    assert_eq!(reports[0].records_written(), 30);
    assert_eq!(store.records(&reports[0].series).await.len(), 90);
}
