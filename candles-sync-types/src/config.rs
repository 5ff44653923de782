//! Configuration types shared across the engine, middleware and adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token-bucket budget for outbound calls to one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained number of calls allowed per minute.
    pub calls_per_minute: u32,
    /// Maximum number of calls that may be issued back-to-back.
    pub burst: u32,
}

impl RateLimitConfig {
    /// Budget of `calls_per_minute` with a burst of the same size. No rolling
    /// minute ever grants more than `calls_per_minute` calls.
    #[must_use]
    pub const fn per_minute(calls_per_minute: u32) -> Self {
        Self {
            calls_per_minute,
            burst: calls_per_minute,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(60)
    }
}

/// Per-exchange limits declared by a sync strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeLimits {
    /// Maximum records returned by one request; `None` when the exchange imposes no limit.
    pub max_batch_records: Option<u32>,
    /// Calls per minute allowed by the exchange.
    pub calls_per_minute: u32,
    /// Width of the default window when the caller supplies no start.
    pub default_sync_days: u32,
}

impl Default for ExchangeLimits {
    fn default() -> Self {
        Self {
            max_batch_records: Some(10_000),
            calls_per_minute: 60,
            default_sync_days: 90,
        }
    }
}

/// Explicit runtime profile passed to the engine at construction.
///
/// Nothing in the engine inspects environment variables; tests and
/// production differ only by the profile they build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeProfile {
    /// When set, replaces every exchange's calls-per-minute budget.
    pub rate_limit_ceiling: Option<u32>,
    /// Prefix prepended to the per-exchange database name.
    pub namespace_prefix: String,
    /// Maximum distance between the first fetched record and the requested start.
    pub first_record_tolerance: Duration,
}

impl RuntimeProfile {
    /// Production profile: exchange budgets as declared, no namespace prefix.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Test profile: effectively unthrottled and isolated under a `test_` namespace.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            rate_limit_ceiling: Some(100_000),
            namespace_prefix: "test_".to_string(),
            ..Self::default()
        }
    }

    /// Effective rate-limit budget for an exchange declaring `limits`.
    #[must_use]
    pub fn rate_limit_for(&self, limits: &ExchangeLimits) -> RateLimitConfig {
        RateLimitConfig::per_minute(self.rate_limit_ceiling.unwrap_or(limits.calls_per_minute))
    }
}

impl Default for RuntimeProfile {
    fn default() -> Self {
        Self {
            rate_limit_ceiling: None,
            namespace_prefix: String::new(),
            first_record_tolerance: Duration::from_secs(10 * 60),
        }
    }
}
