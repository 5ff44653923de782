//! Builder for composing adapters with middleware layers.
//!
//! Layers are stored outermost-first and applied in reverse during
//! [`AdapterBuilder::build`], so the last layer added wraps all others.

use std::sync::Arc;
use std::time::Duration;

use candles_sync_core::{ExchangeAdapter, Middleware};
use serde_json::json;

use crate::rate_limit::{RateLimitMiddleware, RateLimiter};
use crate::timeout::TimeoutMiddleware;

const RATE_LIMIT: &str = "RateLimitedAdapter";
const TIMEOUT: &str = "TimeoutAdapter";

/// Middleware builder for composing an adapter with layered wrappers.
pub struct AdapterBuilder {
    raw: Arc<dyn ExchangeAdapter>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl AdapterBuilder {
    /// Create a new builder from a raw, unwrapped adapter.
    #[must_use]
    pub fn new(raw: Arc<dyn ExchangeAdapter>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Add or replace rate limiting at the outermost position.
    #[must_use]
    pub fn with_rate_limit(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.layers.retain(|m| m.name() != RATE_LIMIT);
        self.layers
            .insert(0, Box::new(RateLimitMiddleware::new(limiter)));
        self
    }

    /// Remove rate limiting if present.
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.layers.retain(|m| m.name() != RATE_LIMIT);
        self
    }

    /// Add or replace a per-call deadline at the innermost position.
    ///
    /// Time spent waiting for a rate-limit slot does not count against it.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.layers.retain(|m| m.name() != TIMEOUT);
        self.layers.push(Box::new(TimeoutMiddleware::new(timeout)));
        self
    }

    /// Add an arbitrary middleware layer at the outermost position inside any
    /// rate limit, so every call it makes is still throttled.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        let at = usize::from(self.layers.first().is_some_and(|m| m.name() == RATE_LIMIT));
        self.layers.insert(at, layer);
        self
    }

    /// Layer names and configs, outermost first, ending with the raw adapter.
    #[must_use]
    pub fn describe(&self) -> Vec<(String, serde_json::Value)> {
        let mut out: Vec<(String, serde_json::Value)> = self
            .layers
            .iter()
            .map(|l| (l.name().to_string(), l.config_json()))
            .collect();
        out.push((
            "RawAdapter".to_string(),
            json!({ "name": self.raw.name(), "exchange": self.raw.exchange().as_str() }),
        ));
        out
    }

    /// Build the wrapped adapter, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn ExchangeAdapter> {
        let mut acc: Arc<dyn ExchangeAdapter> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}
