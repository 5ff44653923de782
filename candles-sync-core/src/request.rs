use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::SyncError;
use crate::types::{FetchParams, TimestampUnit};

/// Parameter names every request format reserves for itself.
pub const RESERVED_PARAMS: [&str; 3] = ["limit", "start", "end"];

/// How an exchange expects the window and page size of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFormat {
    /// Name of the window start parameter.
    pub start_param: String,
    /// Name of the window end parameter.
    pub end_param: String,
    /// Name of the page size parameter; `None` when the exchange has none.
    pub limit_param: Option<String>,
    /// Unit the exchange expects window bounds in.
    pub unit: TimestampUnit,
}

impl Default for RequestFormat {
    fn default() -> Self {
        Self {
            start_param: "start".to_string(),
            end_param: "end".to_string(),
            limit_param: Some("limit".to_string()),
            unit: TimestampUnit::Millis,
        }
    }
}

impl RequestFormat {
    /// Format with custom start/end names and unit; keeps the `limit` parameter.
    pub fn new(
        start_param: impl Into<String>,
        end_param: impl Into<String>,
        unit: TimestampUnit,
    ) -> Self {
        Self {
            start_param: start_param.into(),
            end_param: end_param.into(),
            unit,
            ..Self::default()
        }
    }

    /// Drop the page size parameter.
    #[must_use]
    pub fn without_limit(mut self) -> Self {
        self.limit_param = None;
        self
    }

    /// Names callers may not set through extra parameters.
    #[must_use]
    pub fn reserved(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = RESERVED_PARAMS.into_iter().collect();
        names.insert(self.start_param.as_str());
        names.insert(self.end_param.as_str());
        if let Some(limit) = &self.limit_param {
            names.insert(limit.as_str());
        }
        names
    }

    /// Reject extra parameters that collide with a reserved name.
    ///
    /// # Errors
    /// Returns `ReservedParam` naming the first collision.
    pub fn check_extra(&self, extra: &FetchParams) -> Result<(), SyncError> {
        let reserved = self.reserved();
        match extra.keys().find(|k| reserved.contains(k.as_str())) {
            Some(param) => Err(SyncError::ReservedParam {
                param: param.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Parameters for the window `[start_ms, end_ms)`.
    ///
    /// `extra` is merged in last; it must already have passed [`check_extra`](Self::check_extra).
    #[must_use]
    pub fn params_for_window(
        &self,
        start_ms: i64,
        end_ms: i64,
        limit: Option<u32>,
        extra: &FetchParams,
    ) -> FetchParams {
        let mut params = FetchParams::new();
        if let (Some(name), Some(limit)) = (&self.limit_param, limit) {
            params.insert(name.clone(), limit.to_string());
        }
        params.insert(
            self.start_param.clone(),
            self.unit.from_millis(start_ms).to_string(),
        );
        params.insert(
            self.end_param.clone(),
            self.unit.from_millis(end_ms).to_string(),
        );
        params.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}
