use std::time::Duration;

use crate::client::RetryConfig;
use crate::offline::DEFAULT_QUEUE_CAPACITY;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3054";
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Deployment environment. Decides where the tenant id is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    /// `production` (any case) is production; anything else is development.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Client settings with defaults and environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub queue_enabled: bool,
    pub queue_max_size: usize,
    pub retry: RetryConfig,
    /// Per-attempt HTTP timeout. `None` leaves attempts unbounded.
    pub timeout: Option<Duration>,
    pub proxy_url: Option<String>,
    pub login_path: String,
    pub environment: Environment,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            queue_enabled: true,
            queue_max_size: DEFAULT_QUEUE_CAPACITY,
            retry: RetryConfig::default(),
            timeout: None,
            proxy_url: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment.
    ///
    /// - `API_BACKEND_URL`
    /// - `API_QUEUE_ENABLED` (`0`/`false` disables the offline queue)
    /// - `API_QUEUE_MAX_SIZE`
    /// - `API_RETRY_MAX_RETRIES`, `API_RETRY_BASE_DELAY_MS`, `API_RETRY_MAX_DELAY_MS`,
    ///   `API_RETRY_EXPONENTIAL`
    /// - `API_HTTP_TIMEOUT_SECS`
    /// - `API_PROXY_URL`
    /// - `API_LOGIN_PATH`
    /// - `APP_ENV`
    ///
    /// Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(default)
        };

        let retry = RetryConfig {
            max_retries: parsed("API_RETRY_MAX_RETRIES")
                .map(|v| v.min(u32::MAX as u64) as u32)
                .unwrap_or(defaults.retry.max_retries),
            base_delay_ms: parsed("API_RETRY_BASE_DELAY_MS").unwrap_or(defaults.retry.base_delay_ms),
            max_delay_ms: parsed("API_RETRY_MAX_DELAY_MS").unwrap_or(defaults.retry.max_delay_ms),
            exponential: flag("API_RETRY_EXPONENTIAL", defaults.retry.exponential),
        };

        Self {
            base_url: lookup("API_BACKEND_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.base_url),
            queue_enabled: flag("API_QUEUE_ENABLED", defaults.queue_enabled),
            queue_max_size: parsed("API_QUEUE_MAX_SIZE")
                .map(|v| v as usize)
                .unwrap_or(defaults.queue_max_size),
            retry,
            timeout: parsed("API_HTTP_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            proxy_url: lookup("API_PROXY_URL").filter(|v| !v.trim().is_empty()),
            login_path: lookup("API_LOGIN_PATH")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.login_path),
            environment: lookup("APP_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or(defaults.environment),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(Error::configuration_with_context(
                "base_url is not a valid absolute URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", self.base_url, e))
                    .with_source("client_config"),
            ));
        }
        if self.queue_max_size == 0 {
            return Err(Error::configuration_with_context(
                "queue_max_size must be at least 1",
                ErrorContext::new()
                    .with_field_path("queue_max_size")
                    .with_source("client_config"),
            ));
        }
        self.retry.validate()
    }
}
