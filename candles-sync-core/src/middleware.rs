//! Middleware trait for wrapping `ExchangeAdapter` implementations.

use std::sync::Arc;

use crate::connector::ExchangeAdapter;

/// Trait implemented by adapter middleware layers.
///
/// A middleware consumes an inner `ExchangeAdapter` and returns a wrapped
/// adapter that augments its behavior (e.g., rate limiting).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner adapter and return the wrapped adapter.
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeAdapter>) -> Arc<dyn ExchangeAdapter>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
