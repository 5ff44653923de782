//! Time-series algorithms shared by the orchestrator and adapters.
//!
//! Modules include:
//! - `window`: split a fetch range into evenly spaced request windows
//! - `plan`: compute the minimal fetch window from a store watermark
//! - `normalize`: turn raw exchange records into validated canonical records
/// Normalization and validation of raw exchange records.
pub mod normalize;
/// Gap planning against the store watermark.
pub mod plan;
/// Window chunking for API-sized requests.
pub mod window;
