use crate::helpers::*;
use candles_sync::{DataType, ExchangeId, SyncRequest};
use candles_sync_core::RequestFormat;
use candles_sync_mock::fixtures::{self, candles, ftx};
use candles_sync_mock::{MemoryStore, MockBehavior, MockExchange};

fn bitfinex_candles() -> MockBehavior {
    MockBehavior::Generate(fixtures::windowed(RequestFormat::default(), |s, e| {
        candles::bitfinex_candles(s, e, MINUTE)
    }))
}

#[tokio::test]
async fn bitfinex_trading_symbols_sync_one_series() {
    let (bitfinex, ctl) = MockExchange::new_with_controller(ExchangeId::Bitfinex);
    ctl.set_fallback(bitfinex_candles()).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[bitfinex], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Bitfinex, "tBTCUSD", interval("1m")).range(T0, T0 + HOUR);
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "candles/trade:1m:tBTCUSD/hist");
    assert_eq!(calls[0].params["sort"], "1");
    assert_eq!(calls[0].params["start"], T0.to_string());
    assert_eq!(calls[0].params["limit"], "10000");

    let stored = store.records(&reports[0].series).await;
    assert_eq!(stored.len(), 60);
    // bitfinex orders columns open, close, high, low
    assert_eq!(stored[0].field("open"), Some(121.0));
    assert_eq!(stored[0].field("close"), Some(122.0));
    assert_eq!(stored[0].field("high"), Some(123.0));
}

#[tokio::test]
async fn bitfinex_funding_symbols_sync_every_period() {
    let (bitfinex, ctl) = MockExchange::new_with_controller(ExchangeId::Bitfinex);
    ctl.set_fallback(bitfinex_candles()).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[bitfinex], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Bitfinex, "fUSD", interval("1m")).range(T0, T0 + HOUR);
    let reports = engine.sync(&req).await.unwrap();

    assert_eq!(reports.len(), 29);
    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 29);
    assert_eq!(calls[0].endpoint, "candles/trade:1m:fUSD:p2/hist");
    assert_eq!(calls[28].endpoint, "candles/trade:1m:fUSD:p30/hist");
    assert!(calls.iter().all(|c| !c.params.contains_key("sort")));

    for (report, days) in reports.iter().zip(2..=30) {
        let period = format!("p{days}");
        assert_eq!(report.series.dimensions["period"], period);
        assert_eq!(report.records_written(), 60);
        let stored = store.records(&report.series).await;
        assert_eq!(stored[0].tag("period"), Some(period.as_str()));
        assert_eq!(stored[0].tag("symbol"), Some("fUSD"));
    }
}

#[tokio::test]
async fn ftx_funding_rates_are_hourly_and_tagged() {
    let (exchange, ctl) = MockExchange::new_with_controller(ExchangeId::Ftx);
    let rates = fixtures::windowed(format(ExchangeId::Ftx, DataType::FundingRates), |s, e| {
        ftx::funding_rates("BTC-PERP", s, e)
    });
    ctl.set_behavior("funding_rates", MockBehavior::Generate(rates)).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + DAY);
    let engine = engine(&[exchange], &store, &clock);

    // the requested interval is ignored; FTX only publishes hourly rates
    let req = SyncRequest::new(ExchangeId::Ftx, DataType::FundingRates, "BTC-PERP", interval("1m"))
        .range(T0, T0 + DAY);
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 1);
    let p = &calls[0].params;
    assert_eq!(p["start_time"], "1640995200");
    assert_eq!(p["end_time"], "1641081600");
    assert_eq!(p["limit"], "500");
    assert_eq!(p["future"], "BTC-PERP");

    let series = &reports[0].series;
    assert_eq!(series.measurement(), "funding_rates_1h");
    let stored = store.records(series).await;
    assert_eq!(stored.len(), 24);
    let first = &stored[0];
    assert_eq!(first.time_ms, T0 + HOUR);
    assert_eq!(first.tag("source"), Some("ftx"));
    assert_eq!(first.tag("interval"), Some("1h"));
    assert_eq!(first.tag("symbol"), Some("BTC-PERP"));
    assert_eq!(first.tag("future"), None);
    assert!(first.field("rate").is_some());
}

#[tokio::test]
async fn ftx_futures_merge_info_and_stats() {
    let now = T0 + DAY + 25 * MINUTE;
    let (exchange, ctl) = MockExchange::new_with_controller(ExchangeId::Ftx);
    ctl.set_behavior(
        "futures/BTC-PERP",
        MockBehavior::Return(vec![ftx::future_info("BTC-PERP")]),
    )
    .await;
    ctl.set_behavior(
        "futures/BTC-PERP/stats",
        MockBehavior::Return(vec![ftx::future_stats(T0 + DAY + HOUR)]),
    )
    .await;
    let store = MemoryStore::new();
    let clock = clock(now);
    let engine = engine(&[exchange], &store, &clock);

    let req = SyncRequest::new(ExchangeId::Ftx, DataType::Futures, "BTC-PERP", interval("1h"))
        .start(T0 + DAY);
    let reports = engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].endpoint, "futures/BTC-PERP");
    assert_eq!(calls[1].endpoint, "futures/BTC-PERP/stats");
    assert!(!calls[0].params.contains_key("limit"));
    assert_eq!(reports[0].windows_fetched(), 1);

    let stored = store.records(&reports[0].series).await;
    assert_eq!(stored.len(), 1);
    let snapshot = &stored[0];
    assert_eq!(snapshot.measurement, "futures_1h");
    assert_eq!(snapshot.time_ms, T0 + DAY);
    assert_eq!(snapshot.field("volume"), Some(32_555.1));
    assert_eq!(snapshot.field("openInterest"), Some(51_300.7));
    assert_eq!(snapshot.field("mark"), Some(47_012.0));
    assert_eq!(snapshot.tag("type"), Some("perpetual"));
    assert_eq!(snapshot.tag("perpetual"), Some("true"));
    assert_eq!(snapshot.tag("expired"), Some("false"));
    for denied in ["name", "underlying", "nextFundingTime"] {
        assert_eq!(snapshot.tag(denied), None, "{denied}");
    }
}
