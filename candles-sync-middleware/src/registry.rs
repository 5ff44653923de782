use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use candles_sync_types::{ExchangeId, RateLimitConfig};

use crate::rate_limit::RateLimiter;

/// One shared [`RateLimiter`] per exchange.
///
/// Clones share the same limiters, so concurrent series syncs against one
/// exchange draw from one budget.
#[derive(Debug, Clone, Default)]
pub struct RateLimiterRegistry {
    limiters: Arc<Mutex<HashMap<ExchangeId, Arc<RateLimiter>>>>,
    fallback: RateLimitConfig,
}

impl RateLimiterRegistry {
    /// Empty registry; unregistered exchanges get the default budget on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry whose unregistered exchanges get `fallback`.
    #[must_use]
    pub fn with_fallback(fallback: RateLimitConfig) -> Self {
        Self {
            limiters: Arc::default(),
            fallback,
        }
    }

    /// Install a limiter for `exchange`, replacing any existing one.
    pub fn register(&self, exchange: ExchangeId, config: RateLimitConfig) -> Arc<RateLimiter> {
        let limiter = Arc::new(RateLimiter::new(config));
        self.limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(exchange, Arc::clone(&limiter));
        limiter
    }

    /// The limiter for `exchange`, created with `config` if none exists yet.
    pub fn get_or_insert(&self, exchange: ExchangeId, config: RateLimitConfig) -> Arc<RateLimiter> {
        let mut map = self.limiters.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            map.entry(exchange)
                .or_insert_with(|| Arc::new(RateLimiter::new(config))),
        )
    }

    /// The limiter for `exchange`, if one was registered.
    #[must_use]
    pub fn get(&self, exchange: ExchangeId) -> Option<Arc<RateLimiter>> {
        self.limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&exchange)
            .cloned()
    }

    /// Wait for a call slot on `exchange`.
    pub async fn acquire(&self, exchange: ExchangeId) {
        let limiter = self.get_or_insert(exchange, self.fallback);
        limiter.acquire().await;
    }
}
