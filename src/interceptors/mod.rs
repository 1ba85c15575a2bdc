//! Request/response interceptors for application-layer cross-cutting concerns.
//!
//! Request interceptors run in registration order and may rewrite the config before it is
//! queued or sent. Response interceptors run in registration order on every result, queued
//! or not. An interceptor that returns `Err` aborts the call: the error reaches the caller
//! as `Err` instead of being folded into an [`ApiResult`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{ApiResult, RequestConfig};
use crate::Result;

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Used as the error source when this interceptor fails.
    fn name(&self) -> &str {
        "request_interceptor"
    }

    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    fn name(&self) -> &str {
        "response_interceptor"
    }

    async fn on_response(&self, result: ApiResult<Value>) -> Result<ApiResult<Value>>;
}

/// Ordered interceptor lists. Cloning is cheap and yields a snapshot.
#[derive(Clone, Default)]
pub struct InterceptorPipeline {
    pub(crate) request: Vec<Arc<dyn RequestInterceptor>>,
    pub(crate) response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.request.push(Arc::new(interceptor));
        self
    }

    pub fn with_response<I: ResponseInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.response.push(Arc::new(interceptor));
        self
    }

    pub fn push_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request.push(interceptor);
    }

    pub fn push_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    pub fn clear(&mut self) {
        self.request.clear();
        self.response.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    pub async fn apply_request(&self, mut config: RequestConfig) -> Result<RequestConfig> {
        for interceptor in &self.request {
            config = interceptor.on_request(config).await.map_err(|e| {
                tracing::error!(interceptor = interceptor.name(), error = %e, "request interceptor failed");
                e
            })?;
        }
        Ok(config)
    }

    pub async fn apply_response(&self, mut result: ApiResult<Value>) -> Result<ApiResult<Value>> {
        for interceptor in &self.response {
            result = interceptor.on_response(result).await.map_err(|e| {
                tracing::error!(interceptor = interceptor.name(), error = %e, "response interceptor failed");
                e
            })?;
        }
        Ok(result)
    }
}

impl std::fmt::Debug for InterceptorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorPipeline")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

/// Adapter turning a synchronous closure into a [`RequestInterceptor`].
pub struct FnRequestInterceptor<F>(F);

#[async_trait]
impl<F> RequestInterceptor for FnRequestInterceptor<F>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig> {
        (self.0)(config)
    }
}

/// Adapter turning a synchronous closure into a [`ResponseInterceptor`].
pub struct FnResponseInterceptor<F>(F);

#[async_trait]
impl<F> ResponseInterceptor for FnResponseInterceptor<F>
where
    F: Fn(ApiResult<Value>) -> Result<ApiResult<Value>> + Send + Sync,
{
    async fn on_response(&self, result: ApiResult<Value>) -> Result<ApiResult<Value>> {
        (self.0)(result)
    }
}

pub fn request_fn<F>(f: F) -> FnRequestInterceptor<F>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    FnRequestInterceptor(f)
}

pub fn response_fn<F>(f: F) -> FnResponseInterceptor<F>
where
    F: Fn(ApiResult<Value>) -> Result<ApiResult<Value>> + Send + Sync,
{
    FnResponseInterceptor(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;
    use crate::Error;

    #[tokio::test]
    async fn request_interceptors_run_in_order() {
        let pipeline = InterceptorPipeline::new()
            .with_request(request_fn(|c: RequestConfig| Ok(c.with_header("X-Step", "one"))))
            .with_request(request_fn(|c: RequestConfig| {
                let step = c.headers.get("X-Step").cloned().unwrap_or_default();
                Ok(c.with_header("X-Step", format!("{}-two", step)))
            }));

        let config = pipeline
            .apply_request(RequestConfig::new(Method::Get, "/api/x"))
            .await
            .unwrap();
        assert_eq!(config.headers.get("X-Step").map(String::as_str), Some("one-two"));
    }

    #[tokio::test]
    async fn failing_interceptor_aborts() {
        let pipeline = InterceptorPipeline::new()
            .with_request(request_fn(|_| Err(Error::interceptor("no tenant selected", "tenant_guard"))))
            .with_request(request_fn(|_| panic!("later interceptors must not run")));

        let err = pipeline
            .apply_request(RequestConfig::new(Method::Post, "/api/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interceptor { .. }));
    }

    #[tokio::test]
    async fn response_interceptors_see_results() {
        let pipeline = InterceptorPipeline::new().with_response(response_fn(|r: ApiResult<Value>| {
            Ok(r.map(|v| serde_json::json!({"wrapped": v})))
        }));
        let out = pipeline
            .apply_response(ApiResult::success(Value::from(1), 200))
            .await
            .unwrap();
        assert_eq!(out.data(), Some(&serde_json::json!({"wrapped": 1})));
    }
}
