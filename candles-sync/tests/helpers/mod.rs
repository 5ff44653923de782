// Shared fixtures for the engine tests: `use helpers::*;`
#![allow(dead_code)]

use std::sync::Arc;

use candles_sync::{
    DataType, ExchangeId, FixedClock, Interval, RuntimeProfile, SyncEngine, strategy_for,
};
use candles_sync_core::RequestFormat;
use candles_sync_mock::fixtures::{self, candles};
use candles_sync_mock::{MemoryStore, MockBehavior, MockExchange, MockExchangeController};

/// 2022-01-01T00:00:00Z
pub const T0: i64 = 1_640_995_200_000;
pub const MINUTE: i64 = 60_000;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

pub fn interval(label: &str) -> Interval {
    Interval::parse(label).unwrap()
}

/// Request format the catalog uses for `exchange`/`data_type`.
pub fn format(exchange: ExchangeId, data_type: DataType) -> RequestFormat {
    strategy_for(exchange, data_type).unwrap().request
}

/// Binance mock answering `klines` with synthetic candles of `bin_ms`.
pub async fn binance(bin_ms: i64) -> (Arc<MockExchange>, MockExchangeController) {
    let (mock, ctl) = MockExchange::new_with_controller(ExchangeId::Binance);
    ctl.set_behavior("klines", binance_klines(bin_ms)).await;
    (mock, ctl)
}

pub fn binance_klines(bin_ms: i64) -> MockBehavior {
    MockBehavior::Generate(fixtures::windowed(
        format(ExchangeId::Binance, DataType::Candles),
        move |s, e| candles::binance_klines(s, e, bin_ms),
    ))
}

pub fn clock(now_ms: i64) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now_ms))
}

/// Engine over `adapters` with the testing profile.
pub fn engine(
    adapters: &[Arc<MockExchange>],
    store: &MemoryStore,
    clock: &Arc<FixedClock>,
) -> SyncEngine {
    let mut builder = SyncEngine::builder()
        .store(Arc::new(store.clone()))
        .clock(clock.clone())
        .profile(RuntimeProfile::testing());
    for adapter in adapters {
        builder = builder.with_adapter(adapter.clone());
    }
    builder.build().unwrap()
}
