//! Test doubles for the candles-sync engine.
//!
//! [`MockExchange`] answers fetches from per-endpoint behaviors set through its
//! [`MockExchangeController`]; [`MemoryStore`] is an in-memory [`SeriesStore`](candles_sync_core::SeriesStore).

mod exchange;
pub mod fixtures;
mod store;

pub use exchange::{FetchCall, Generator, MockBehavior, MockExchange, MockExchangeController};
pub use store::MemoryStore;
