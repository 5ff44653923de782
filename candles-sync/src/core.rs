use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use candles_sync_core::{
    Clock, ExchangeAdapter, ExchangeId, RuntimeProfile, SeriesStore, SyncError, SystemClock,
};
use candles_sync_middleware::{AdapterBuilder, RateLimiterRegistry};

use crate::catalog;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrator that keeps stored series in step with the exchanges.
///
/// Holds one rate-limited adapter per exchange, the store, the clock and the
/// runtime profile. Cheap to share behind an `Arc`; concurrent syncs of
/// different series only share the per-exchange rate limiters.
pub struct SyncEngine {
    pub(crate) adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
    pub(crate) store: Arc<dyn SeriesStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) profile: RuntimeProfile,
    pub(crate) limiters: RateLimiterRegistry,
}

/// Builder for constructing a [`SyncEngine`].
pub struct SyncEngineBuilder {
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    store: Option<Arc<dyn SeriesStore>>,
    clock: Arc<dyn Clock>,
    profile: RuntimeProfile,
    limiters: RateLimiterRegistry,
    call_timeout: Duration,
}

impl Default for SyncEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEngineBuilder {
    /// Builder with the production profile, the system clock and a 30s call timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            store: None,
            clock: Arc::new(SystemClock),
            profile: RuntimeProfile::production(),
            limiters: RateLimiterRegistry::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Register the raw adapter of an exchange.
    ///
    /// A later adapter for the same exchange replaces the earlier one.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Store watermarks are read from and batches written to.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SeriesStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Source of "now" for range defaults, resume phases and synthetic timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runtime profile (rate-limit ceiling, namespace, sanity tolerance).
    #[must_use]
    pub fn profile(mut self, profile: RuntimeProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Share rate limiters with other engines or callers.
    ///
    /// Limiters already registered for an exchange are kept as they are.
    #[must_use]
    pub fn rate_limiters(mut self, registry: RateLimiterRegistry) -> Self {
        self.limiters = registry;
        self
    }

    /// Deadline for a single exchange call; rate-limit waits are not included.
    #[must_use]
    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Build the engine, wrapping every adapter in its exchange's rate limiter.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no adapter or no store was provided.
    pub fn build(self) -> Result<SyncEngine, SyncError> {
        if self.adapters.is_empty() {
            return Err(SyncError::InvalidArg(
                "no adapters registered; add at least one via with_adapter(...)".into(),
            ));
        }
        let store = self.store.ok_or_else(|| {
            SyncError::InvalidArg("no store configured; set one via store(...)".into())
        })?;

        let mut adapters = HashMap::new();
        for raw in self.adapters {
            let exchange = raw.exchange();
            let budget = self
                .profile
                .rate_limit_for(&catalog::exchange_limits(exchange));
            let limiter = self.limiters.get_or_insert(exchange, budget);
            let wrapped = AdapterBuilder::new(raw)
                .with_timeout(self.call_timeout)
                .with_rate_limit(limiter)
                .build();
            adapters.insert(exchange, wrapped);
        }

        Ok(SyncEngine {
            adapters,
            store,
            clock: self.clock,
            profile: self.profile,
            limiters: self.limiters,
        })
    }
}

impl SyncEngine {
    /// Start building a new engine.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use candles_sync::{SyncEngine, SyncRequest};
    ///
    /// let engine = SyncEngine::builder()
    ///     .with_adapter(binance.clone())
    ///     .store(store.clone())
    ///     .build()?;
    /// let reports = engine.sync(&SyncRequest::candles(ExchangeId::Binance, "BTCUSDT", one_minute)).await?;
    /// ```
    #[must_use]
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::new()
    }

    /// The runtime profile the engine was built with.
    #[must_use]
    pub const fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    /// Registry holding the per-exchange rate limiters.
    #[must_use]
    pub const fn rate_limiters(&self) -> &RateLimiterRegistry {
        &self.limiters
    }

    /// Exchanges with a registered adapter.
    #[must_use]
    pub fn exchanges(&self) -> Vec<ExchangeId> {
        let mut out: Vec<ExchangeId> = self.adapters.keys().copied().collect();
        out.sort();
        out
    }

    pub(crate) fn adapter(&self, exchange: ExchangeId) -> Option<&Arc<dyn ExchangeAdapter>> {
        self.adapters.get(&exchange)
    }
}
