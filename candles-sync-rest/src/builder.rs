use std::time::Duration;

use candles_sync_core::{ExchangeId, SyncError};
use url::Url;

use crate::RestAdapter;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`RestAdapter`].
#[derive(Debug, Clone)]
pub struct RestAdapterBuilder {
    exchange: ExchangeId,
    base_url: String,
    result_key: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl RestAdapterBuilder {
    pub(crate) fn new(exchange: ExchangeId) -> Self {
        Self {
            exchange,
            base_url: crate::default_base_url(exchange).to_string(),
            result_key: crate::default_result_key(exchange).map(str::to_string),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Override the API root (e.g. a mock server in tests).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the envelope member holding the payload; `None` for bare payloads.
    #[must_use]
    pub fn result_key(mut self, key: Option<&str>) -> Self {
        self.result_key = key.map(str::to_string);
        self
    }

    /// Per-call timeout; an expired call fails with `Transport`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Custom `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Build the adapter.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable base URL and `Transport` when
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<RestAdapter, SyncError> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|e| SyncError::InvalidArg(format!("base url '{}': {e}", self.base_url)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut client = reqwest::Client::builder().timeout(self.timeout);
        if let Some(ua) = &self.user_agent {
            client = client.user_agent(ua.clone());
        }
        let client = client
            .build()
            .map_err(|e| SyncError::transport(self.exchange.as_str(), e.to_string()))?;
        Ok(RestAdapter::from_parts(
            self.exchange,
            client,
            base,
            self.result_key,
        ))
    }
}
