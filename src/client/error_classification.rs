//! Error classification logic

use serde_json::Value;

use crate::error_code::ErrorCode;
use crate::types::ApiError;

/// Statuses worth another attempt: request timeout, rate limiting and transient 5xx.
const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Determine if a failed HTTP status may be retried.
///
/// Everything outside the fixed set is terminal, including status `0` (no response).
pub fn is_retryable(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

pub fn is_unauthorized(status: u16) -> bool {
    status == 401
}

/// Pull a human-readable message out of an error body.
///
/// Tries `{message}`, then `{error: {message}}`, then `{errors: [{message}, ..]}` (first
/// element). Non-object bodies (plain text, proxy HTML pages) yield `None`.
pub fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => {
            if let Some(Value::String(m)) = map.get("message") {
                return Some(m.clone());
            }
            if let Some(Value::String(m)) = map.get("error").and_then(|e| e.get("message")) {
                return Some(m.clone());
            }
            map.get("errors")
                .and_then(|e| e.as_array())
                .and_then(|arr| arr.first())
                .and_then(|first| first.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        }
        _ => None,
    }
}

/// Build the typed error for a failed HTTP response.
///
/// The code depends on the status alone. The body contributes the message and is kept
/// whole as `details` (so envelope `code` and `field` stay available), unless it is empty.
pub fn classify(status: u16, body: &Value) -> ApiError {
    let code = ErrorCode::from_http_status(status);
    let message =
        extract_message(body).unwrap_or_else(|| code.default_message(status).to_string());

    let details = match body {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other.clone()),
    };

    ApiError {
        message,
        code,
        status_code: status,
        details,
    }
}
