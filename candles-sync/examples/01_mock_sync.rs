use std::sync::Arc;

use candles_sync::{ExchangeId, FixedClock, Interval, RuntimeProfile, SyncEngine, SyncRequest};
use candles_sync_mock::fixtures::{self, candles};
use candles_sync_mock::{MemoryStore, MockBehavior, MockExchange};
use tracing_subscriber::fmt::format::FmtSpan;

const MINUTE: i64 = 60_000;
const HOUR: i64 = 60 * MINUTE;
/// 2022-01-01T00:00:00Z
const T0: i64 = 1_640_995_200_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=debug (build with --features tracing to see engine spans)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let (binance, ctl) = MockExchange::new_with_controller(ExchangeId::Binance);
    let format = candles_sync::strategy_for(ExchangeId::Binance, candles_sync::DataType::Candles)?
        .request;
    ctl.set_behavior(
        "klines",
        MockBehavior::Generate(fixtures::windowed(format, |s, e| {
            candles::binance_klines(s, e, MINUTE)
        })),
    )
    .await;

    let store = MemoryStore::new();
    let clock = Arc::new(FixedClock::new(T0 + 48 * HOUR));
    let engine = SyncEngine::builder()
        .with_adapter(binance)
        .store(Arc::new(store.clone()))
        .clock(clock.clone())
        .profile(RuntimeProfile::testing())
        .build()?;

    let one_minute = Interval::parse("1m")?;

    // The last day first, then the whole range: the second run backfills the
    // older day and resumes from the newest stored candle.
    let recent = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", one_minute.clone())
        .start(T0 + 24 * HOUR);
    let all = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", one_minute).start(T0);

    for req in [&recent, &all, &all] {
        for report in engine.sync(req).await? {
            println!(
                "{}: {} windows, {} records{}",
                report.series,
                report.windows_fetched(),
                report.records_written(),
                if report.was_noop() { " (up to date)" } else { "" }
            );
        }
        clock.advance(5 * MINUTE);
    }
    println!("exchange calls: {}", ctl.call_count().await);
    Ok(())
}
