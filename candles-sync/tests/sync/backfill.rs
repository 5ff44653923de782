use crate::helpers::*;
use candles_sync::{ExchangeId, SyncPhase, SyncRequest, SyncState};
use candles_sync_mock::MemoryStore;

#[tokio::test]
async fn earlier_start_backfills_then_resumes_to_now() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + 11 * HOUR);
    let engine = engine(&[binance], &store, &clock);

    let recent = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
        .range(T0 + 10 * HOUR, T0 + 11 * HOUR);
    engine.sync(&recent).await.unwrap();
    ctl.clear_calls().await;

    clock.set(T0 + 12 * HOUR);
    let older = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).start(T0);
    let reports = engine.sync(&older).await.unwrap();
    let report = &reports[0];

    assert_eq!(report.state, SyncState::Done);
    assert_eq!(report.phases.len(), 2);

    let initial = &report.phases[0];
    assert_eq!(initial.phase, SyncPhase::Initial);
    assert_eq!(initial.plan.fetch_start, T0);
    assert_eq!(initial.plan.fetch_end, T0 + 601 * MINUTE);
    assert_eq!(initial.plan.resume_from, Some(T0 + 11 * HOUR));
    assert_eq!(initial.records_written, 601);

    let resume = &report.phases[1];
    assert_eq!(resume.phase, SyncPhase::Resume);
    assert_eq!(resume.plan.fetch_start, T0 + 11 * HOUR);
    assert_eq!(resume.plan.fetch_end, T0 + 12 * HOUR);
    assert_eq!(resume.plan.resume_from, None);
    assert_eq!(resume.records_written, 60);

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].params["endTime"], (T0 + 601 * MINUTE).to_string());
    assert_eq!(calls[1].params["startTime"], (T0 + 11 * HOUR).to_string());

    let stored = store.records(&report.series).await;
    assert_eq!(stored.len(), 720);
    assert_eq!(stored[0].time_ms, T0 + MINUTE);
    assert_eq!(stored.last().unwrap().time_ms, T0 + 12 * HOUR);
    assert!(stored.windows(2).all(|w| w[1].time_ms - w[0].time_ms == MINUTE));
}

#[tokio::test]
async fn start_within_one_bin_of_stored_history_does_not_backfill() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);
    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).start(T0);

    engine.sync(&req).await.unwrap();
    ctl.clear_calls().await;

    let reports = engine.sync(&req).await.unwrap();
    assert_eq!(reports[0].phases.len(), 1);
    assert!(reports[0].was_noop());
    assert_eq!(ctl.call_count().await, 0);
}

#[tokio::test]
async fn resume_less_than_a_bin_behind_now_is_not_sanity_checked() {
    let (binance, _ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + 11 * HOUR);
    let engine = engine(&[binance], &store, &clock);

    let recent = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
        .range(T0 + 10 * HOUR, T0 + 11 * HOUR);
    engine.sync(&recent).await.unwrap();

    // the live edge has no closed bin yet, so the resume window comes back empty
    clock.set(T0 + 11 * HOUR + 30_000);
    let older = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).start(T0);
    let reports = engine.sync(&older).await.unwrap();
    let report = &reports[0];

    assert_eq!(report.state, SyncState::Done);
    assert_eq!(report.phases.len(), 2);
    assert_eq!(report.phases[0].records_written, 601);

    let resume = &report.phases[1];
    assert_eq!(resume.phase, SyncPhase::Resume);
    assert_eq!(resume.plan.fetch_start, T0 + 11 * HOUR);
    assert_eq!(resume.records_written, 0);

    assert_eq!(store.records(&report.series).await.len(), 660);
}
