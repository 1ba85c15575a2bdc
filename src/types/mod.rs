//! Wire-level types: request descriptions, results and response envelopes.

pub mod request;
pub mod result;

pub use request::{Method, RequestConfig, RequestOptions};
pub use result::{ApiEnvelope, ApiError, ApiResult, ErrorBody, ErrorEnvelope, ResponseMeta};
