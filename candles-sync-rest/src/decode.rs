use candles_sync_core::{RawRecord, SyncError};
use serde_json::Value;

/// Convert a decoded response body into raw records.
///
/// With `result_key`, the payload is first taken from that member of the
/// envelope object. An array yields one record per element; a single object
/// yields one keyed record.
///
/// # Errors
/// Returns `Transport` (attributed to `exchange`) when the envelope key is
/// missing or the payload is not made of records.
pub fn records_from_json(
    exchange: &str,
    body: Value,
    result_key: Option<&str>,
) -> Result<Vec<RawRecord>, SyncError> {
    let payload = match result_key {
        Some(key) => match body {
            Value::Object(mut envelope) => envelope.remove(key).ok_or_else(|| {
                SyncError::transport(exchange, format!("response has no '{key}' member"))
            })?,
            other => {
                return Err(SyncError::transport(
                    exchange,
                    format!("expected an envelope object, got {}", kind(&other)),
                ));
            }
        },
        None => body,
    };
    match payload {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                let what = kind(&item);
                RawRecord::from_json(item).map_err(|_| {
                    SyncError::transport(exchange, format!("unexpected {what} in record list"))
                })
            })
            .collect(),
        Value::Object(map) => Ok(vec![RawRecord::Keyed(map)]),
        other => Err(SyncError::transport(
            exchange,
            format!("expected records, got {}", kind(&other)),
        )),
    }
}

const fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
