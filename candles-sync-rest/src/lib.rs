#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod adapter;
mod builder;
mod decode;

pub use adapter::RestAdapter;
pub use builder::RestAdapterBuilder;
pub use decode::records_from_json;

use candles_sync_core::ExchangeId;

/// Public API root of `exchange`.
#[must_use]
pub const fn default_base_url(exchange: ExchangeId) -> &'static str {
    match exchange {
        ExchangeId::Binance => "https://api.binance.com/api/v3/",
        ExchangeId::Bitfinex => "https://api-pub.bitfinex.com/v2/",
        ExchangeId::Ftx => "https://ftx.com/api/",
    }
}

/// Key the payload of `exchange` is wrapped under, if any.
#[must_use]
pub const fn default_result_key(exchange: ExchangeId) -> Option<&'static str> {
    match exchange {
        ExchangeId::Ftx => Some("result"),
        ExchangeId::Binance | ExchangeId::Bitfinex => None,
    }
}
