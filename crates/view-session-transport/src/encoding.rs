//! Payload and response-body encoding for the wire.

use serde_json::Value;
use view_session_core::{Payload, Response, TransportError};

/// Flatten a payload into query-string pairs.
///
/// Strings are sent as-is, `null` as an empty value and anything else as
/// its JSON text.
#[must_use]
pub fn query_pairs(payload: &Payload) -> Vec<(String, String)> {
    payload
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Decode a response body. A blank body is a `null` response.
///
/// # Errors
/// Returns `TransportError::Decode` if the body is not JSON.
pub fn decode_body(body: &[u8]) -> Result<Response, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Response::new(Value::Null));
    }
    serde_json::from_slice(body)
        .map(Response::new)
        .map_err(|e| TransportError::Decode(e.to_string()))
}
