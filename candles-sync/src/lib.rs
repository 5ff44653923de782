//! candles-sync keeps exchange time series in a time-series store up to date.
//!
//! Overview
//! - [`catalog`] declares, per exchange and data type, how requests are named,
//!   paged and rate limited, and how records are laid out.
//! - [`SyncEngine`] plans each series against the store watermark, fetches only
//!   the missing range window by window through a rate-limited adapter,
//!   validates and normalizes records and writes them batch by batch.
//! - A backfill (requested start before the stored data) is followed by a
//!   resume pass from the stored latest up to now.
//! - [`SyncEngine::sync_many`] runs independent series concurrently; they share
//!   only the per-exchange rate limiters.
//!
//! Errors are [`SyncError`]s. Configuration problems surface before any
//! network call; failures during a run are wrapped with the series and phase.
//! Batches written before a failure stay written, and a later run picks up
//! from the stored watermark.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use candles_sync::{ExchangeId, Interval, SyncEngine, SyncRequest};
//!
//! let engine = SyncEngine::builder()
//!     .with_adapter(binance)
//!     .store(store)
//!     .build()?;
//! let request = SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", Interval::parse("1m")?)
//!     .start(1_640_995_200_000);
//! for report in engine.sync(&request).await? {
//!     println!("{}: {} records", report.series, report.records_written());
//! }
//! ```
#![warn(missing_docs)]

mod batch;
pub mod catalog;
mod core;
mod sync;

pub use crate::batch::BatchReport;
pub use crate::catalog::{SyncJob, SyncStrategy, strategy_by_name, strategy_for};
pub use crate::core::{SyncEngine, SyncEngineBuilder};
pub use crate::sync::SyncRequest;

pub use candles_sync_core::{
    Clock, DataType, ExchangeAdapter, ExchangeId, FixedClock, Interval, PhaseReport,
    RuntimeProfile, SeriesKey, SeriesStore, SyncError, SyncPhase, SyncPlan, SyncReport, SyncState,
    SystemClock,
};
