use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use candles_sync_core::{
    ExchangeAdapter, ExchangeId, FetchParams, FieldLayout, Middleware, RawRecord, SyncError,
};

/// Adapter wrapper that bounds every fetch by a deadline.
///
/// An elapsed deadline is reported as a `Transport` error; the call is not retried.
pub struct TimeoutAdapter {
    inner: Arc<dyn ExchangeAdapter>,
    timeout: Duration,
}

impl TimeoutAdapter {
    /// Wrap `inner` so each fetch fails after `timeout`.
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeAdapter>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The per-call deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ExchangeAdapter for TimeoutAdapter {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn exchange(&self) -> ExchangeId {
        self.inner.exchange()
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candles_sync::middleware::timeout::fetch",
            skip(self, params),
            fields(
                adapter = self.inner.name(),
                timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    async fn fetch(
        &self,
        endpoint: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawRecord>, SyncError> {
        (tokio::time::timeout(self.timeout, self.inner.fetch(endpoint, params)).await)
            .unwrap_or_else(|_| {
                Err(SyncError::transport(
                    self.inner.name(),
                    format!(
                        "'{endpoint}' timed out after {}ms",
                        self.timeout.as_millis()
                    ),
                ))
            })
    }

    fn candle_field_layout(&self) -> FieldLayout {
        self.inner.candle_field_layout()
    }
}

/// Middleware config for constructing a [`TimeoutAdapter`].
pub struct TimeoutMiddleware {
    pub timeout: Duration,
}

impl TimeoutMiddleware {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Middleware for TimeoutMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn ExchangeAdapter>) -> Arc<dyn ExchangeAdapter> {
        Arc::new(TimeoutAdapter::new(inner, self.timeout))
    }

    fn name(&self) -> &'static str {
        "TimeoutAdapter"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "timeout_ms": u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
