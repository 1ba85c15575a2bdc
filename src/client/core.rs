use std::sync::{Arc, RwLock};

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::activity::ActivityTracker;
use crate::auth::AuthHandler;
use crate::client::config::ClientConfig;
use crate::client::execution::RequestPipeline;
use crate::client::policy::RetryController;
use crate::interceptors::{InterceptorPipeline, RequestInterceptor, ResponseInterceptor};
use crate::offline::{Connectivity, OfflineQueue};
use crate::transport::TenantIdSource;
use crate::types::{ApiResult, Method, RequestConfig, RequestOptions};
use crate::Result;

/// Resilient client for the backend REST API.
///
/// Verbs return `Ok(ApiResult)` for every outcome the server or network can produce.
/// `Err` is reserved for interceptor failures and offline-queue rejections. Cloning is
/// cheap; clones share the session, queue and interceptors.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) pipeline: Arc<RequestPipeline>,
    pub(crate) auth: Arc<AuthHandler>,
    pub(crate) retry: Arc<RetryController>,
    pub(crate) queue: Option<Arc<OfflineQueue>>,
    pub(crate) connectivity: Arc<Connectivity>,
    pub(crate) interceptors: Arc<RwLock<InterceptorPipeline>>,
    pub(crate) activity: Option<Arc<ActivityTracker>>,
    pub(crate) tenant: Arc<dyn TenantIdSource>,
}

impl ApiClient {
    /// Client for `base_url` with environment defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        crate::client::builder::ApiClientBuilder::new()
            .base_url(base_url)
            .build()
    }

    pub fn builder() -> crate::client::builder::ApiClientBuilder {
        crate::client::builder::ApiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthHandler> {
        &self.auth
    }

    pub fn retry_controller(&self) -> &RetryController {
        &self.retry
    }

    pub fn connectivity(&self) -> &Arc<Connectivity> {
        &self.connectivity
    }

    pub fn activity(&self) -> Option<&Arc<ActivityTracker>> {
        self.activity.as_ref()
    }

    pub fn tenant_source(&self) -> &Arc<dyn TenantIdSource> {
        &self.tenant
    }

    /// Fresh token for cancelling one or more requests.
    pub fn cancel_token(&self) -> CancellationToken {
        CancellationToken::new()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Feed the host's connectivity signal. Going online drains the offline queue.
    pub fn set_online(&self, online: bool) {
        self.connectivity.set_online(online);
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.send(RequestConfig::new(Method::Get, url).with_options(options))
            .await
    }

    pub async fn post<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> Result<ApiResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::Post, url, body, options).await
    }

    pub async fn patch<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> Result<ApiResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::Patch, url, body, options).await
    }

    pub async fn put<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> Result<ApiResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::Put, url, body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.send(RequestConfig::new(Method::Delete, url).with_options(options))
            .await
    }

    async fn send_with_body<B, T>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut config = RequestConfig::new(method, url).with_options(options);
        match serde_json::to_value(body) {
            Ok(value) => config.body = Some(value),
            Err(e) => {
                tracing::warn!(method = %method, url, error = %e, "failed to serialize request body, sending none")
            }
        }
        self.send(config).await
    }

    async fn send<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<ApiResult<T>> {
        Ok(self.request(config).await?.decode())
    }

    /// Run one request through interceptors, the offline queue or the retry pipeline.
    pub async fn request(&self, config: RequestConfig) -> Result<ApiResult<Value>> {
        let interceptors = self
            .interceptors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let config = interceptors.apply_request(config).await?;

        let result = match &self.queue {
            Some(queue) if config.method.is_mutating() && queue.is_offline() => {
                let pipeline = Arc::clone(&self.pipeline);
                let activity = self.activity.clone();
                let queued = config.clone();
                let response = queue.enqueue(
                    config,
                    Box::new(move || {
                        async move {
                            let _busy = activity.as_ref().map(|a| a.begin());
                            pipeline.run(&queued).await
                        }
                        .boxed()
                    }),
                )?;
                response.await?
            }
            _ => {
                let _busy = self.activity.as_ref().map(|a| a.begin());
                self.pipeline.run(&config).await
            }
        };

        interceptors.apply_response(result).await
    }

    pub fn add_request_interceptor<I: RequestInterceptor + 'static>(&self, interceptor: I) {
        self.interceptors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_request(Arc::new(interceptor));
    }

    pub fn add_response_interceptor<I: ResponseInterceptor + 'static>(&self, interceptor: I) {
        self.interceptors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_response(Arc::new(interceptor));
    }

    pub fn clear_interceptors(&self) {
        self.interceptors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of requests waiting for connectivity (`0` when the queue is disabled).
    pub fn queue_size(&self) -> usize {
        self.queue.as_ref().map(|q| q.len()).unwrap_or(0)
    }

    /// Reject every queued request with [`crate::Error::QueueCleared`].
    pub fn clear_queue(&self) -> usize {
        self.queue.as_ref().map(|q| q.clear()).unwrap_or(0)
    }

    /// Replay queued requests now, if online. Returns how many ran.
    pub async fn drain_queue(&self) -> usize {
        match &self.queue {
            Some(queue) => queue.drain().await,
            None => 0,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("online", &self.is_online())
            .field("queue_size", &self.queue_size())
            .finish_non_exhaustive()
    }
}
