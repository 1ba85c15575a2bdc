//! Closed error-code taxonomy for backend API failures.
//!
//! Every failed request surfaces exactly one [`ErrorCode`]. For HTTP failures the code is a
//! pure function of the status code; transport-level failures (no HTTP response, status `0`)
//! use [`ErrorCode::NetworkError`], [`ErrorCode::Timeout`] or [`ErrorCode::Cancelled`].
//!
//! | Status            | Code                  |
//! |-------------------|-----------------------|
//! | 400, 422          | `VALIDATION_ERROR`    |
//! | 401               | `UNAUTHORIZED`        |
//! | 403               | `FORBIDDEN`           |
//! | 404               | `NOT_FOUND`           |
//! | 409               | `CONFLICT`            |
//! | 429               | `TOO_MANY_REQUESTS`   |
//! | 500               | `SERVER_ERROR`        |
//! | 502, 503, 504     | `SERVICE_UNAVAILABLE` |
//! | 0                 | `NETWORK_ERROR`       |
//! | anything else     | `UNKNOWN`             |
//!
//! ## Example
//!
//! ```rust
//! use enterprise_api_client::error_code::ErrorCode;
//!
//! let code = ErrorCode::from_http_status(503);
//! assert_eq!(code, ErrorCode::ServiceUnavailable);
//! assert_eq!(code.as_str(), "SERVICE_UNAVAILABLE");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code attached to every [`crate::ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 400 / 422: malformed request or rejected payload
    ValidationError,
    /// 401: missing, invalid or expired session
    Unauthorized,
    /// 403: authenticated but not allowed
    Forbidden,
    /// 404: resource does not exist
    NotFound,
    /// 409: resource already exists or state conflict
    Conflict,
    /// 429: rate limited
    TooManyRequests,
    /// 500: internal server error
    ServerError,
    /// 502 / 503 / 504: upstream gateway or service temporarily unavailable
    ServiceUnavailable,
    /// No HTTP response was received (DNS, refused connection, reset)
    NetworkError,
    /// A client-side timeout fired before a response was received
    Timeout,
    /// The caller cancelled the request
    Cancelled,
    /// Anything the table does not cover
    Unknown,
}

impl ErrorCode {
    /// Returns the wire representation (e.g. `"NOT_FOUND"`).
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::ServerError => "SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Maps an HTTP status code to its error code. Status `0` means "no HTTP response".
    pub fn from_http_status(status: u16) -> Self {
        match status {
            0 => Self::NetworkError,
            400 | 422 => Self::ValidationError,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::TooManyRequests,
            500 => Self::ServerError,
            502..=504 => Self::ServiceUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Message used when the response body does not carry one.
    ///
    /// 400 and 422 share a code but not a message, so the status is consulted as well.
    pub fn default_message(&self, status: u16) -> &'static str {
        match self {
            Self::ValidationError if status == 400 => "Invalid request",
            Self::ValidationError => "Validation error",
            Self::Unauthorized => "Unauthorized. Please login again.",
            Self::Forbidden => "Access denied",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::TooManyRequests => "Too many requests. Please try again later.",
            Self::ServerError => "Internal server error",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::NetworkError => "Network error. Please check your connection.",
            Self::Timeout => "Request timed out",
            Self::Cancelled => "Request was cancelled",
            Self::Unknown => "An unexpected error occurred",
        }
    }

    /// True for codes that are produced without an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout | Self::Cancelled)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
