#![doc = include_str!("../README.md")]
//! candles-sync-middleware
//!
//! Re-exports for middleware wrappers.

mod builder;
mod rate_limit;
mod registry;
mod timeout;

pub use crate::builder::AdapterBuilder;
pub use crate::rate_limit::{RateLimitMiddleware, RateLimitedAdapter, RateLimiter};
pub use crate::registry::RateLimiterRegistry;
pub use crate::timeout::{TimeoutAdapter, TimeoutMiddleware};
