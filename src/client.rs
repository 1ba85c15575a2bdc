//! Resilient API client: facade, configuration, retry policy and error classification.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod config;
pub mod core;
pub mod error_classification;
mod execution;
pub mod policy;

pub use builder::ApiClientBuilder;
pub use config::{ClientConfig, Environment};
pub use core::ApiClient;
pub use policy::{backoff_delay, delay_with_jitter, RetryConfig, RetryController};
