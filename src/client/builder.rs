use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use crate::activity::ActivityTracker;
use crate::auth::{
    AuthEvent, AuthHandler, Navigator, NoSessionProvider, NoopNavigator, SessionCache,
    SessionProvider,
};
use crate::client::config::{ClientConfig, Environment};
use crate::client::core::ApiClient;
use crate::client::execution::RequestPipeline;
use crate::client::policy::{RetryConfig, RetryController};
use crate::interceptors::{InterceptorPipeline, RequestInterceptor, ResponseInterceptor};
use crate::offline::{Connectivity, OfflineQueue};
use crate::transport::{tenant, HttpTransport, TenantIdSource};
use crate::Result;

/// Builder for [`ApiClient`].
///
/// Starts from [`ClientConfig::from_env`]; every setter overrides the environment value.
pub struct ApiClientBuilder {
    config: ClientConfig,
    session_provider: Option<Arc<dyn SessionProvider>>,
    navigator: Option<Arc<dyn Navigator>>,
    tenant_source: Option<Arc<dyn TenantIdSource>>,
    connectivity: Option<Arc<Connectivity>>,
    session_cache: Option<Arc<SessionCache>>,
    activity: Option<Arc<ActivityTracker>>,
    interceptors: InterceptorPipeline,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::from_config(ClientConfig::from_env())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            session_provider: None,
            navigator: None,
            tenant_source: None,
            connectivity: None,
            session_cache: None,
            activity: None,
            interceptors: InterceptorPipeline::new(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Default retry settings; individual requests may still override them.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn queue_enabled(mut self, enabled: bool) -> Self {
        self.config.queue_enabled = enabled;
        self
    }

    pub fn queue_max_size(mut self, max_size: usize) -> Self {
        self.config.queue_max_size = max_size;
        self
    }

    /// Per-attempt HTTP timeout. Expiry surfaces as `TIMEOUT` with status `0`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn login_path(mut self, login_path: impl Into<String>) -> Self {
        self.config.login_path = login_path.into();
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Session backend used for tokens, refresh and sign-out. Default: anonymous.
    pub fn session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.session_provider = Some(provider);
        self
    }

    /// Receives the login redirect on unrecoverable 401s. Default: no-op.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Tenant-id side channel. Default: cookie in production, key-value store otherwise.
    pub fn tenant_source(mut self, source: Arc<dyn TenantIdSource>) -> Self {
        self.tenant_source = Some(source);
        self
    }

    /// Share a connectivity signal with the host. Default: a private one, initially online.
    pub fn connectivity(mut self, connectivity: Arc<Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn session_cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.session_cache = Some(cache);
        self
    }

    /// Count every request on `tracker` while it runs.
    pub fn activity_tracker(mut self, tracker: Arc<ActivityTracker>) -> Self {
        self.activity = Some(tracker);
        self
    }

    pub fn request_interceptor<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors = self.interceptors.with_request(interceptor);
        self
    }

    pub fn response_interceptor<I: ResponseInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors = self.interceptors.with_response(interceptor);
        self
    }

    /// Validate the configuration and wire the components together.
    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;
        let config = self.config;

        let tenant = self
            .tenant_source
            .unwrap_or_else(|| tenant::source_for_environment(config.environment));
        let transport = Arc::new(HttpTransport::new(
            config.base_url.clone(),
            Arc::clone(&tenant),
            config.timeout,
            config.proxy_url.as_deref(),
        )?);

        let auth = Arc::new(AuthHandler::new(
            self.session_provider
                .unwrap_or_else(|| Arc::new(NoSessionProvider)),
            self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
            self.session_cache
                .unwrap_or_else(|| Arc::new(SessionCache::new())),
            config.login_path.clone(),
        ));

        let retry = Arc::new(RetryController::new(config.retry));
        let connectivity = self.connectivity.unwrap_or_else(Connectivity::new);

        let queue = if config.queue_enabled {
            let queue = OfflineQueue::new(config.queue_max_size, Arc::clone(&connectivity));
            let weak: Weak<OfflineQueue> = Arc::downgrade(&queue);
            auth.events().subscribe(move |event| {
                if *event != AuthEvent::SignedOut {
                    return;
                }
                if let Some(queue) = weak.upgrade() {
                    queue.clear();
                }
            });
            Some(queue)
        } else {
            None
        };

        tracing::debug!(
            base_url = %config.base_url,
            queue_enabled = config.queue_enabled,
            max_retries = config.retry.max_retries,
            "api client built"
        );

        Ok(ApiClient {
            pipeline: Arc::new(RequestPipeline::new(
                transport,
                Arc::clone(&auth),
                Arc::clone(&retry),
            )),
            config: Arc::new(config),
            auth,
            retry,
            queue,
            connectivity,
            interceptors: Arc::new(RwLock::new(self.interceptors)),
            activity: self.activity,
            tenant,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn rejects_invalid_retry_bounds() {
        let err = ApiClientBuilder::from_config(ClientConfig::default())
            .retry(RetryConfig {
                max_retries: 3,
                base_delay_ms: 2_000,
                max_delay_ms: 1_000,
                exponential: true,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn queue_can_be_disabled() {
        let client = ApiClientBuilder::from_config(ClientConfig::default())
            .queue_enabled(false)
            .build()
            .unwrap();
        assert_eq!(client.queue_size(), 0);
        assert!(client.queue.is_none());
    }

    #[test]
    fn builder_overrides_config() {
        let client = ApiClientBuilder::from_config(ClientConfig::default())
            .base_url("http://127.0.0.1:9")
            .login_path("/sign-in")
            .queue_max_size(3)
            .build()
            .unwrap();
        assert_eq!(client.config().base_url, "http://127.0.0.1:9");
        assert_eq!(client.config().login_path, "/sign-in");
        assert_eq!(client.config().queue_max_size, 3);
        assert!(client.is_online());
    }
}
