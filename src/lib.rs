//! # enterprise-api-client
//!
//! Resilient HTTP client for the enterprise administration backend.
//!
//! Every call goes through the same lifecycle: request interceptors, then either the
//! offline queue (mutating requests while offline) or the retry loop, which wraps a single
//! authenticated attempt with one refresh-and-replay on 401. Response interceptors see the
//! result last.
//!
//! ## Results, not exceptions
//!
//! Failures the server or network can produce (4xx, 5xx, no response, cancellation) come
//! back as [`ApiResult::Failure`] carrying an [`ApiError`] with a closed [`ErrorCode`].
//! Only programmer errors (failing interceptors, bad configuration) and offline-queue
//! rejections are reported as [`Error`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enterprise_api_client::{ApiClient, ApiResult, RequestOptions};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> enterprise_api_client::Result<()> {
//!     enterprise_api_client::logging::init_tracing();
//!
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com")
//!         .build()?;
//!
//!     let locales: ApiResult<Value> = client
//!         .get("/api/locales", RequestOptions::new().public())
//!         .await?;
//!
//!     match locales {
//!         ApiResult::Success { data, status } => println!("{}: {}", status, data),
//!         ApiResult::Failure { error, .. } => eprintln!("{} ({})", error.message, error.code),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Facade, builder, configuration, retry policy, error classification |
//! | [`transport`] | Single-attempt HTTP executor and tenant-id sources |
//! | [`auth`] | Session provider seam, single-flight refresh, session cache, login redirect |
//! | [`offline`] | Connectivity signal and the bounded offline queue |
//! | [`interceptors`] | Request/response interceptor hooks |
//! | [`observer`] | Subject/listener fan-out used for events |
//! | [`activity`] | In-flight request counter |
//! | [`types`] | Request configs, results and response envelopes |
//! | [`sdk`] | Typed endpoint wrappers (feature `sdk`) |
//! | [`logging`] | `tracing-subscriber` setup |

pub mod activity;
pub mod auth;
pub mod client;
pub mod error_code;
pub mod interceptors;
pub mod logging;
pub mod observer;
pub mod offline;
pub mod transport;
pub mod types;

#[cfg(feature = "sdk")]
pub mod sdk;

// Re-export main types for convenience
pub use activity::{ActivityGuard, ActivityTracker};
pub use auth::{AuthEvent, AuthHandler, Navigator, Session, SessionProvider, User};
pub use client::{ApiClient, ApiClientBuilder, ClientConfig, Environment, RetryConfig};
pub use error_code::ErrorCode;
pub use interceptors::{request_fn, response_fn, RequestInterceptor, ResponseInterceptor};
pub use offline::{Connectivity, ConnectivityEvent};
pub use types::{ApiEnvelope, ApiError, ApiResult, Method, RequestConfig, RequestOptions};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
