//! candles-sync-core
//!
//! Core types, traits, and algorithms shared across the candles-sync workspace.
//!
//! - `types`: canonical and raw records, watermarks, timestamp units, endpoints.
//! - `layout`: the immutable `FieldLayout` descriptor adapters declare.
//! - `connector`: the `ExchangeAdapter` trait (fetch one window).
//! - `store`: the `SeriesStore` trait (watermarks and batch writes).
//! - `timeseries`: window chunking, gap planning and normalization.
//!
//! All timestamps handled here are integer milliseconds since the Unix epoch.
#![warn(missing_docs)]

/// Wall-clock abstraction so runs can be driven deterministically.
pub mod clock;
/// The `ExchangeAdapter` trait implemented once per exchange.
pub mod connector;
/// Field layout descriptors for raw exchange records.
pub mod layout;
/// Middleware trait implemented by adapter wrappers.
pub mod middleware;
/// Request parameter naming and construction for one fetch window.
pub mod request;
/// The `SeriesStore` trait consumed by the planner and orchestrator.
pub mod store;
/// Chunking, planning and normalization.
pub mod timeseries;
pub mod types;

pub use candles_sync_types::*;
pub use clock::{Clock, FixedClock, SystemClock};
pub use connector::ExchangeAdapter;
pub use layout::{FieldLayout, OhlcvColumns};
pub use middleware::Middleware;
pub use request::RequestFormat;
pub use store::SeriesStore;
pub use timeseries::normalize::Normalizer;
pub use timeseries::plan::{Cadence, GapPlanner};
pub use timeseries::window::{WindowBoundaries, WindowPairs, window_boundaries};
pub use types::*;
