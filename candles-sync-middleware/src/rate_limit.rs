//! Token-bucket rate limiter and the adapter wrapper that applies it.
//!
//! Throttling is latency, never an error: `acquire` sleeps until a slot is
//! free. Waiters are served in arrival order because the bucket is guarded by
//! a fair `tokio::sync::Mutex` that is held across the wait.
//!
//! The bucket bounds back-to-back calls; a log of recent grants bounds every
//! rolling minute to `calls_per_minute`, however large the burst.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use candles_sync_core::{
    ExchangeAdapter, ExchangeId, FetchParams, FieldLayout, Middleware, RateLimitConfig, RawRecord,
    SyncError,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(60);

/// Async token bucket shared by every task calling one exchange.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
    /// Grant instants within the last minute, oldest first.
    granted: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(config.burst.max(1)),
                refilled_at: Instant::now(),
                granted: VecDeque::new(),
            }),
        }
    }

    /// The configured budget.
    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    fn capacity(&self) -> f64 {
        f64::from(self.config.burst.max(1))
    }

    fn tokens_per_sec(&self) -> f64 {
        f64::from(self.config.calls_per_minute.max(1)) / 60.0
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.refilled_at);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.tokens_per_sec()).min(self.capacity());
        bucket.refilled_at = now;
    }

    /// How long to wait before a slot is free at `now`; `None` if one is free.
    fn wait_needed(&self, bucket: &mut Bucket, now: Instant) -> Option<Duration> {
        while bucket
            .granted
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= WINDOW)
        {
            bucket.granted.pop_front();
        }
        let token_wait = (bucket.tokens < 1.0).then(|| {
            Duration::from_secs_f64((1.0 - bucket.tokens) / self.tokens_per_sec())
                .max(Duration::from_millis(1))
        });
        let window_full = bucket.granted.len() >= self.config.calls_per_minute.max(1) as usize;
        let window_wait = bucket
            .granted
            .front()
            .filter(|_| window_full)
            .map(|oldest| (*oldest + WINDOW).saturating_duration_since(now));
        token_wait.max(window_wait)
    }

    fn take(bucket: &mut Bucket, now: Instant) {
        bucket.tokens -= 1.0;
        bucket.granted.push_back(now);
    }

    /// Wait until a call slot is free, then take it.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        loop {
            let now = Instant::now();
            self.refill(&mut bucket, now);
            let Some(wait) = self.wait_needed(&mut bucket, now) else {
                Self::take(&mut bucket, now);
                return;
            };
            #[cfg(feature = "tracing")]
            tracing::debug!(
                calls_per_minute = self.config.calls_per_minute,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "rate limit wait"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a slot only if one is free right now.
    pub async fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        self.refill(&mut bucket, now);
        if self.wait_needed(&mut bucket, now).is_some() {
            return false;
        }
        Self::take(&mut bucket, now);
        true
    }
}

/// Adapter wrapper that takes a rate-limit slot before every fetch.
pub struct RateLimitedAdapter {
    inner: Arc<dyn ExchangeAdapter>,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedAdapter {
    /// Wrap `inner` so that its calls go through `limiter`.
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeAdapter>, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// Access the inner adapter.
    pub fn inner(&self) -> &Arc<dyn ExchangeAdapter> {
        &self.inner
    }

    /// The limiter calls are gated by.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl ExchangeAdapter for RateLimitedAdapter {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn exchange(&self) -> ExchangeId {
        self.inner.exchange()
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawRecord>, SyncError> {
        self.limiter.acquire().await;
        self.inner.fetch(endpoint, params).await
    }

    fn candle_field_layout(&self) -> FieldLayout {
        self.inner.candle_field_layout()
    }
}

/// Middleware config for constructing a [`RateLimitedAdapter`].
pub struct RateLimitMiddleware {
    pub limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    #[must_use]
    pub const fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Middleware for RateLimitMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeAdapter>) -> Arc<dyn ExchangeAdapter> {
        Arc::new(RateLimitedAdapter::new(inner, self.limiter))
    }

    fn name(&self) -> &'static str {
        "RateLimitedAdapter"
    }

    fn config_json(&self) -> serde_json::Value {
        let cfg = self.limiter.config();
        serde_json::json!({
            "calls_per_minute": cfg.calls_per_minute,
            "burst": cfg.burst,
        })
    }
}
