use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of a sync run in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPhase {
    /// The first pass over the resolved range (fresh sync, backfill or append).
    Initial,
    /// The second pass from the resume point to now after a backfill.
    Resume,
}

impl SyncPhase {
    /// Stable identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Resume => "resume",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Raised before any network call; never retried.
    Configuration,
    /// The first fetched window did not look like the requested range.
    SanityCheck,
    /// A record violated the canonical record invariants.
    DataIntegrity,
    /// The exchange call failed at the network/HTTP level.
    Transport,
    /// The time-series store failed.
    Store,
}

/// Unified error type for the candles-sync workspace.
///
/// Configuration variants are raised before any network call. Failures that
/// happen while a series is being synced are wrapped in [`SyncError::Phase`]
/// so the message names the series and the phase.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// Caller-supplied request parameters collide with a reserved name.
    #[error("cannot override reserved request parameter '{param}'")]
    ReservedParam {
        /// The offending parameter name.
        param: String,
    },

    /// Caller-supplied tags try to redefine a reserved tag.
    #[error("cannot override reserved tag '{tag}'")]
    ReservedTag {
        /// The offending tag name.
        tag: String,
    },

    /// No sync strategy exists for the exchange/data-type combination.
    #[error("no sync adapter for exchange '{exchange}' and data type '{data_type}'")]
    NoSuchAdapter {
        /// Exchange name as requested.
        exchange: String,
        /// Data type as requested.
        data_type: String,
    },

    /// A field layout descriptor is inconsistent.
    #[error("invalid field layout: {0}")]
    InvalidLayout(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The first fetched window was empty or did not start near the requested start.
    #[error("sanity check failed: {reason}")]
    SanityCheck {
        /// Human-readable description of the mismatch.
        reason: String,
    },

    /// A record violated price or timestamp invariants, or could not be read.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// The exchange call failed (HTTP status, network, timeout, undecodable body).
    #[error("{exchange} transport failed: {msg}")]
    Transport {
        /// Exchange or adapter name.
        exchange: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The time-series store rejected a read or write.
    #[error("store failed: {0}")]
    Store(String),

    /// A failure raised while syncing a specific series.
    #[error("{series} [{phase}]: {error}")]
    Phase {
        /// Display form of the series key.
        series: String,
        /// Phase in which the failure happened.
        phase: SyncPhase,
        /// The underlying failure.
        error: Box<SyncError>,
    },
}

impl SyncError {
    /// Helper: build a `Transport` error.
    pub fn transport(exchange: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            exchange: exchange.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `SanityCheck` error.
    pub fn sanity(reason: impl Into<String>) -> Self {
        Self::SanityCheck {
            reason: reason.into(),
        }
    }

    /// Helper: build a `DataIntegrity` error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    /// Helper: build a `NoSuchAdapter` error.
    pub fn no_such_adapter(exchange: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::NoSuchAdapter {
            exchange: exchange.into(),
            data_type: data_type.into(),
        }
    }

    /// Wrap `self` with the series and phase it happened in.
    ///
    /// Already wrapped errors are returned unchanged.
    #[must_use]
    pub fn in_phase(self, series: impl fmt::Display, phase: SyncPhase) -> Self {
        match self {
            wrapped @ Self::Phase { .. } => wrapped,
            other => Self::Phase {
                series: series.to_string(),
                phase,
                error: Box::new(other),
            },
        }
    }

    /// The innermost error, unwrapping any `Phase` context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Phase { error, .. } => error.root(),
            other => other,
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::ReservedParam { .. }
            | Self::ReservedTag { .. }
            | Self::NoSuchAdapter { .. }
            | Self::InvalidLayout(_)
            | Self::InvalidArg(_) => ErrorCategory::Configuration,
            Self::SanityCheck { .. } => ErrorCategory::SanityCheck,
            Self::DataIntegrity(_) => ErrorCategory::DataIntegrity,
            Self::Store(_) => ErrorCategory::Store,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Phase { error, .. } => error.category(),
        }
    }

    /// True when the error is a configuration problem detected before any network call.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// True when the exchange had no usable data at the start of the requested range.
    ///
    /// Batch callers use this to skip assets that were listed after the requested start.
    #[must_use]
    pub fn is_missing_history(&self) -> bool {
        self.category() == ErrorCategory::SanityCheck
    }
}
