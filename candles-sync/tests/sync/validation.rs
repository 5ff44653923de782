use std::sync::Arc;

use crate::helpers::*;
use candles_sync::{DataType, ExchangeId, SyncEngine, SyncError, SyncRequest};
use candles_sync_mock::MemoryStore;

#[tokio::test]
async fn reserved_params_are_rejected_before_any_call() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    for param in ["limit", "startTime", "endTime", "start", "symbol", "interval"] {
        let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
            .range(T0, T0 + HOUR)
            .extra_param(param, "1");
        let err = engine.sync(&req).await.unwrap_err();
        assert_eq!(
            err,
            SyncError::ReservedParam {
                param: param.to_string()
            }
        );
        assert!(err.is_configuration());
    }
    assert_eq!(ctl.call_count().await, 0);
}

#[tokio::test]
async fn other_extra_params_are_forwarded() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m"))
        .range(T0, T0 + HOUR)
        .extra_param("timeZone", "0");
    engine.sync(&req).await.unwrap();

    let calls = ctl.calls().await;
    assert_eq!(calls[0].params["timeZone"], "0");
    assert_eq!(calls[0].params["symbol"], "BTCUSDT");
}

#[tokio::test]
async fn unsupported_combinations_have_no_adapter() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let futures = SyncRequest::new(ExchangeId::Binance, DataType::Futures, "BTCUSDT", interval("1h"));
    assert_eq!(
        engine.sync(&futures).await.unwrap_err(),
        SyncError::no_such_adapter("binance", "futures")
    );

    // supported by the catalog, but no FTX adapter was registered
    let rates = SyncRequest::new(ExchangeId::Ftx, DataType::FundingRates, "BTC-PERP", interval("1h"));
    assert_eq!(
        engine.sync(&rates).await.unwrap_err(),
        SyncError::no_such_adapter("ftx", "funding_rates")
    );
    assert_eq!(ctl.call_count().await, 0);
}

#[tokio::test]
async fn inverted_range_is_invalid() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1m")).range(T0 + HOUR, T0);
    let err = engine.sync(&req).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidArg(_)));
    assert_eq!(ctl.call_count().await, 0);
}

#[tokio::test]
async fn empty_symbol_is_invalid() {
    let (binance, ctl) = binance(MINUTE).await;
    let store = MemoryStore::new();
    let clock = clock(T0 + HOUR);
    let engine = engine(&[binance], &store, &clock);

    let req = SyncRequest::candles(ExchangeId::Binance, " ", interval("1m")).range(T0, T0 + HOUR);
    assert!(matches!(
        engine.sync(&req).await.unwrap_err(),
        SyncError::InvalidArg(_)
    ));
    assert_eq!(ctl.call_count().await, 0);
}

#[tokio::test]
async fn builder_needs_an_adapter_and_a_store() {
    let Err(err) = SyncEngine::builder()
        .store(Arc::new(MemoryStore::new()))
        .build()
    else {
        panic!("engine without adapters must not build");
    };
    assert!(matches!(err, SyncError::InvalidArg(_)));

    let (binance, _ctl) = binance(MINUTE).await;
    let Err(err) = SyncEngine::builder().with_adapter(binance).build() else {
        panic!("engine without a store must not build");
    };
    assert!(matches!(err, SyncError::InvalidArg(_)));
}

#[tokio::test]
async fn engine_lists_its_exchanges_and_limiters() {
    let (binance, _b) = binance(MINUTE).await;
    let (ftx, _f) = candles_sync_mock::MockExchange::new_with_controller(ExchangeId::Ftx);
    let store = MemoryStore::new();
    let clock = clock(T0);
    let engine = engine(&[ftx, binance], &store, &clock);

    assert_eq!(engine.exchanges(), vec![ExchangeId::Binance, ExchangeId::Ftx]);
    assert!(engine.rate_limiters().get(ExchangeId::Ftx).is_some());
    assert!(engine.rate_limiters().get(ExchangeId::Bitfinex).is_none());
    assert_eq!(engine.profile().namespace_prefix, "test_");
}

#[tokio::test]
async fn missing_bounds_default_to_the_sync_window() {
    let now = T0 + 100 * DAY;
    let (binance, ctl) = binance(DAY).await;
    let store = MemoryStore::new();
    let clock = clock(now);
    let engine = engine(&[binance], &store, &clock);
    let daily = || SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", interval("1d"));

    let reports = engine.sync(&daily()).await.unwrap();
    let calls = ctl.calls().await;
    assert_eq!(calls[0].params["startTime"], (now - 90 * DAY).to_string());
    assert_eq!(calls[0].params["endTime"], now.to_string());
    assert_eq!(reports[0].records_written(), 90);

    // only an end: the window ends there
    let fresh = MemoryStore::new();
    let (engine, ctl) = engine_with(&fresh, &clock).await;
    engine.sync(&daily().end(T0 + 95 * DAY)).await.unwrap();
    let calls = ctl.calls().await;
    assert_eq!(calls[0].params["startTime"], (T0 + 5 * DAY).to_string());
    assert_eq!(calls[0].params["endTime"], (T0 + 95 * DAY).to_string());

    // only a start: the window runs to now
    let fresh = MemoryStore::new();
    let (engine, ctl) = engine_with(&fresh, &clock).await;
    let reports = engine.sync(&daily().start(T0 + 95 * DAY)).await.unwrap();
    let calls = ctl.calls().await;
    assert_eq!(calls[0].params["endTime"], now.to_string());
    assert_eq!(reports[0].records_written(), 5);
}

async fn engine_with(
    store: &MemoryStore,
    clock: &Arc<candles_sync::FixedClock>,
) -> (SyncEngine, candles_sync_mock::MockExchangeController) {
    let (binance, ctl) = binance(DAY).await;
    (engine(&[binance], store, clock), ctl)
}
