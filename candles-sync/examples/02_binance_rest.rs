use std::sync::Arc;

use candles_sync::{ExchangeId, Interval, SyncEngine, SyncRequest};
use candles_sync_mock::MemoryStore;
use candles_sync_rest::RestAdapter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    // Hits the public Binance API; no credentials needed.
    let binance = Arc::new(RestAdapter::builder(ExchangeId::Binance).build()?);
    let store = MemoryStore::new();
    let engine = SyncEngine::builder()
        .with_adapter(binance)
        .store(Arc::new(store.clone()))
        .build()?;

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCUSDT".to_string());
    let now = chrono::Utc::now().timestamp_millis();
    let req = SyncRequest::candles(ExchangeId::Binance, symbol, Interval::parse("1h")?)
        .start(now - 3 * 24 * 3_600_000);

    for report in engine.sync(&req).await? {
        let stored = store.records(&report.series).await;
        println!(
            "{}: {} records, last close {:?}",
            report.series,
            stored.len(),
            stored.last().and_then(|r| r.field("close"))
        );
    }
    Ok(())
}
