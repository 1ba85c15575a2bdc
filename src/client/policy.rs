use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::error_classification::is_retryable;
use crate::error_code::ErrorCode;
use crate::types::ApiResult;
use crate::{Error, ErrorContext, Result};

/// Share of the exponential delay that may be added on top as jitter.
const JITTER_RATIO: f64 = 0.3;

/// Bounded retry settings. Constructed once; per-request overrides replace it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first one (`3` means up to four attempts).
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            exponential: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::configuration_with_context(
                "base_delay_ms must be greater than zero",
                ErrorContext::new()
                    .with_field_path("retry.base_delay_ms")
                    .with_source("retry_config"),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::configuration_with_context(
                "max_delay_ms must be >= base_delay_ms",
                ErrorContext::new()
                    .with_field_path("retry.max_delay_ms")
                    .with_details(format!(
                        "base_delay_ms={}, max_delay_ms={}",
                        self.base_delay_ms, self.max_delay_ms
                    ))
                    .with_source("retry_config"),
            ));
        }
        Ok(())
    }
}

/// Delay before the attempt following `attempt`, for a given position `unit` in the jitter band.
///
/// `unit` is clamped to `[0, 1]`; `0` yields the plain exponential value, `1` the top of the
/// 30 % band. The result never exceeds `max_delay_ms`.
pub fn delay_with_jitter(attempt: u32, config: &RetryConfig, unit: f64) -> Duration {
    if !config.exponential {
        return Duration::from_millis(config.base_delay_ms.min(config.max_delay_ms));
    }

    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let exponential = config.base_delay_ms.saturating_mul(factor);
    let jitter = (exponential as f64 * JITTER_RATIO * unit.clamp(0.0, 1.0)) as u64;
    let chosen = exponential.saturating_add(jitter).min(config.max_delay_ms);
    Duration::from_millis(chosen)
}

/// Randomized backoff for `attempt` (0-based).
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    delay_with_jitter(attempt, config, rand::random::<f64>())
}

/// Wraps an attempt function with bounded exponential-backoff retry.
#[derive(Debug, Default)]
pub struct RetryController {
    default_config: RwLock<RetryConfig>,
}

impl RetryController {
    pub fn new(default_config: RetryConfig) -> Self {
        Self {
            default_config: RwLock::new(default_config),
        }
    }

    pub fn default_config(&self) -> RetryConfig {
        *self
            .default_config
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn update_default_config(&self, config: RetryConfig) -> Result<()> {
        config.validate()?;
        *self
            .default_config
            .write()
            .unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    /// Run `attempt_fn` until it succeeds, the predicate declines, or the budget is spent.
    ///
    /// `attempt_fn` receives the 0-based attempt index. `should_retry(status, attempt)` is
    /// consulted after each failure; `CANCELLED` failures are returned without asking it.
    /// The last failure is returned when every attempt failed.
    pub async fn execute_with_retry<T, F, Fut, P>(
        &self,
        mut attempt_fn: F,
        config: Option<&RetryConfig>,
        should_retry: P,
    ) -> ApiResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
        P: Fn(u16, u32) -> bool,
    {
        let config = config.copied().unwrap_or_else(|| self.default_config());
        let mut attempt = 0u32;

        loop {
            let result = attempt_fn(attempt).await;
            let status = match &result {
                ApiResult::Success { .. } => return result,
                ApiResult::Failure { error, .. } if error.code == ErrorCode::Cancelled => {
                    tracing::debug!(attempt, "request cancelled, not retrying");
                    return result;
                }
                ApiResult::Failure { status, .. } => *status,
            };

            if attempt >= config.max_retries || !should_retry(status, attempt) {
                if attempt > 0 {
                    tracing::warn!(status, attempts = attempt + 1, "giving up after retries");
                }
                return result;
            }

            let delay = backoff_delay(attempt, &config);
            tracing::debug!(
                status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retryable failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// [`Self::execute_with_retry`] with the standard predicate: retryable status and budget left.
    pub async fn execute_with_default_policy<T, F, Fut>(
        &self,
        attempt_fn: F,
        config: Option<&RetryConfig>,
    ) -> ApiResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let max_retries = config
            .copied()
            .unwrap_or_else(|| self.default_config())
            .max_retries;
        self.execute_with_retry(
            attempt_fn,
            config,
            move |status, attempt| is_retryable(status) && attempt < max_retries,
        )
        .await
    }
}
