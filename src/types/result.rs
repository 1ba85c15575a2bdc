//! Result and envelope types shared by every layer of the client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_code::ErrorCode;

/// Normalized failure description returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub code: ErrorCode,
    /// HTTP status, or `0` when no response was received.
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            code,
            status_code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "Request was cancelled", 0)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message, 0)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}] {}", self.code, self.status_code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Outcome of a request: exactly one of data or error, always with a status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResult<T> {
    Success { data: T, status: u16 },
    Failure { error: ApiError, status: u16 },
}

impl<T> ApiResult<T> {
    pub fn success(data: T, status: u16) -> Self {
        ApiResult::Success { data, status }
    }

    /// Failure whose status mirrors the error's status code.
    pub fn failure(error: ApiError) -> Self {
        let status = error.status_code;
        ApiResult::Failure { error, status }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResult::Success { status, .. } | ApiResult::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResult::Success { data, .. } => Ok(data),
            ApiResult::Failure { error, .. } => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Success { data, status } => ApiResult::Success {
                data: f(data),
                status,
            },
            ApiResult::Failure { error, status } => ApiResult::Failure { error, status },
        }
    }
}

impl ApiResult<Value> {
    /// Decode the JSON payload into a typed value.
    ///
    /// A payload that does not match `T` becomes an `UNKNOWN` failure that keeps the
    /// original status and carries the raw payload in `details`.
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        match self {
            ApiResult::Success { data, status } => match T::deserialize(&data) {
                Ok(typed) => ApiResult::Success {
                    data: typed,
                    status,
                },
                Err(e) => {
                    tracing::warn!(status, error = %e, "response body does not match expected type");
                    ApiResult::Failure {
                        error: ApiError::new(
                            ErrorCode::Unknown,
                            format!("Failed to decode response body: {}", e),
                            status,
                        )
                        .with_details(data),
                        status,
                    }
                }
            },
            ApiResult::Failure { error, status } => ApiResult::Failure { error, status },
        }
    }
}

/// Success envelope used by the backend: `{data, meta?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Pagination and tracing metadata attached to envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error envelope used by the backend: `{error: {code, message, details?, field?}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_exactly_one_side() {
        let ok: ApiResult<Value> = ApiResult::success(json!([1, 2]), 200);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"data": [1, 2], "status": 200})
        );

        let err: ApiResult<Value> =
            ApiResult::failure(ApiError::new(ErrorCode::NotFound, "Resource not found", 404));
        let v = serde_json::to_value(&err).unwrap();
        assert!(v.get("data").is_none());
        assert_eq!(v["status"], 404);
        assert_eq!(v["error"]["code"], "NOT_FOUND");
        assert_eq!(v["error"]["statusCode"], 404);
    }

    #[test]
    fn decode_mismatch_becomes_failure_with_status() {
        #[derive(Debug, Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let raw: ApiResult<Value> = ApiResult::success(json!({"id": 7}), 200);
        let typed = raw.decode::<Named>();
        let err = typed.error().expect("decode should fail");
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(typed.status(), 200);
        assert_eq!(err.details, Some(json!({"id": 7})));
    }

    #[test]
    fn null_body_decodes_into_unit() {
        let raw: ApiResult<Value> = ApiResult::success(Value::Null, 204);
        let typed = raw.decode::<()>();
        assert!(typed.is_success());
        assert_eq!(typed.status(), 204);
    }

    #[test]
    fn envelope_meta_is_optional() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_value(json!({"data": [1], "meta": {"total": 1, "page": 1}})).unwrap();
        assert_eq!(env.meta.as_ref().and_then(|m| m.total), Some(1));

        let bare: ApiEnvelope<Vec<u32>> = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(bare.meta.is_none());
    }
}
