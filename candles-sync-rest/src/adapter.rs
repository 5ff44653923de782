use async_trait::async_trait;
use candles_sync_core::{ExchangeAdapter, ExchangeId, FetchParams, RawRecord, SyncError};
use url::Url;

use crate::RestAdapterBuilder;
use crate::decode::records_from_json;

/// HTTP adapter for one exchange's public REST API.
#[derive(Debug, Clone)]
pub struct RestAdapter {
    exchange: ExchangeId,
    client: reqwest::Client,
    base_url: Url,
    result_key: Option<String>,
}

impl RestAdapter {
    /// Builder with the exchange's default base URL, envelope and a 30s timeout.
    #[must_use]
    pub fn builder(exchange: ExchangeId) -> RestAdapterBuilder {
        RestAdapterBuilder::new(exchange)
    }

    pub(crate) fn from_parts(
        exchange: ExchangeId,
        client: reqwest::Client,
        base_url: Url,
        result_key: Option<String>,
    ) -> Self {
        Self {
            exchange,
            client,
            base_url,
            result_key,
        }
    }

    /// API root requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn transport(&self, msg: impl Into<String>) -> SyncError {
        SyncError::transport(self.exchange.as_str(), msg)
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, SyncError> {
        // "./" keeps segments such as "trade:1m:tBTCUSD" from parsing as a scheme.
        self.base_url
            .join(&format!("./{}", endpoint.trim_start_matches('/')))
            .map_err(|e| SyncError::InvalidArg(format!("endpoint '{endpoint}': {e}")))
    }
}

#[async_trait]
impl ExchangeAdapter for RestAdapter {
    fn name(&self) -> &'static str {
        "candles-sync-rest"
    }

    fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "candles_sync_rest::fetch",
            skip(self, params),
            fields(exchange = %self.exchange),
        )
    )]
    async fn fetch(
        &self,
        endpoint: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawRecord>, SyncError> {
        let url = self.endpoint_url(endpoint)?;
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.transport(format!("request to '{endpoint}' timed out"))
                } else {
                    self.transport(e.to_string())
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.transport(format!("HTTP {status}: {}", body.trim())));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| self.transport(format!("undecodable body: {e}")))?;
        let records = records_from_json(self.exchange.as_str(), body, self.result_key.as_deref())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(records = records.len(), "fetched");
        Ok(records)
    }
}
