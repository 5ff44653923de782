use async_trait::async_trait;

use crate::layout::FieldLayout;
use crate::types::{FetchParams, RawRecord};
use crate::{ExchangeId, SyncError};

/// Fetch side of one exchange: issues one call for one window.
///
/// Implementations own their HTTP client (sessions are reused across calls)
/// and never retry; any failure is reported as `SyncError::Transport`.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Adapter name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Exchange this adapter talks to.
    fn exchange(&self) -> ExchangeId;

    /// Issue one request against `endpoint` with the given query parameters
    /// and return the raw records in exchange order (oldest first).
    async fn fetch(
        &self,
        endpoint: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawRecord>, SyncError>;

    /// Column layout of this exchange's OHLCV candles.
    fn candle_field_layout(&self) -> FieldLayout {
        FieldLayout::candles_for(self.exchange())
    }
}
