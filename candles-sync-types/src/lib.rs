//! Candles-sync data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod plan;
mod reports;
mod series;

pub use config::{ExchangeLimits, RateLimitConfig, RuntimeProfile};
pub use error::{ErrorCategory, SyncError, SyncPhase};
pub use plan::SyncPlan;
pub use reports::{PhaseReport, SyncReport, SyncState};
pub use series::{DataType, ExchangeId, Interval, SeriesKey};
