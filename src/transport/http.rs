use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Proxy;
use serde_json::Value;

use crate::client::error_classification::classify;
use crate::error_code::ErrorCode;
use crate::transport::{TenantIdSource, TransportError};
use crate::types::{ApiError, ApiResult, RequestConfig};
use crate::Result;

/// Header carrying the tenant (enterprise) id on tenant-scoped requests.
pub const TENANT_HEADER: &str = "X-Enterprise-ID";

/// Performs exactly one HTTP attempt per call. Retry, refresh and queueing live above it.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    tenant: Arc<dyn TenantIdSource>,
}

impl HttpTransport {
    /// `timeout` is opt-in; without it an attempt only ends on response, failure or cancellation.
    pub fn new(
        base_url: impl Into<String>,
        tenant: Arc<dyn TenantIdSource>,
        timeout: Option<Duration>,
        proxy_url: Option<&str>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_url) = proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(proxy = proxy_url, error = %e, "ignoring invalid proxy url"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; relative ones are joined to the base with one `/`.
    pub fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// `Content-Type` first, then caller headers (which may override it), then
    /// `Authorization` and the tenant header.
    pub fn build_headers(
        &self,
        config: &RequestConfig,
        token: Option<&str>,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &config.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping invalid request header"),
            }
        }

        if !config.skip_auth {
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                match HeaderValue::from_str(&format!("Bearer {}", token)) {
                    Ok(value) => {
                        headers.insert(AUTHORIZATION, value);
                    }
                    Err(_) => tracing::warn!("access token is not a valid header value"),
                }
            }
        }

        if config.include_tenant_id {
            if let Some(id) = self.tenant.tenant_id() {
                match HeaderValue::from_str(&id) {
                    Ok(value) => {
                        headers.insert(HeaderName::from_static("x-enterprise-id"), value);
                    }
                    Err(_) => tracing::warn!("tenant id is not a valid header value"),
                }
            }
        }

        headers
    }

    /// Run one attempt.
    ///
    /// Non-2xx responses come back classified. Transport failures use status `0` with
    /// `CANCELLED`, `TIMEOUT` or `NETWORK_ERROR`.
    pub async fn execute(&self, config: &RequestConfig, token: Option<&str>) -> ApiResult<Value> {
        let url = self.build_url(&config.url);
        let mut request = self
            .client
            .request(config.method.to_reqwest(), &url)
            .headers(self.build_headers(config, token));

        if let Some(body) = encode_body(config.body.as_ref()) {
            request = request.body(body);
        }

        let attempt = async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, content_type, text))
        };

        let outcome = match &config.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(method = %config.method, url = %url, "request cancelled");
                        return ApiResult::failure(ApiError::cancelled());
                    }
                    outcome = attempt => outcome,
                }
            }
            None => attempt.await,
        };

        match outcome {
            Ok((status, content_type, text)) => {
                let body = parse_body(status, content_type.as_deref(), text);
                if (200..300).contains(&status) {
                    ApiResult::success(body, status)
                } else {
                    tracing::debug!(method = %config.method, url = %url, status, "request failed");
                    ApiResult::failure(classify(status, &body))
                }
            }
            Err(e) => {
                let error = transport_failure(&e);
                tracing::warn!(
                    method = %config.method,
                    url = %url,
                    code = %error.code,
                    error = %TransportError::Http(e),
                    "no response received"
                );
                ApiResult::failure(error)
            }
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `None` and `null` send no body; strings are sent verbatim; everything else as JSON.
fn encode_body(body: Option<&Value>) -> Option<String> {
    match body? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => match serde_json::to_string(other) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize request body, sending none");
                None
            }
        },
    }
}

fn parse_body(status: u16, content_type: Option<&str>, text: String) -> Value {
    if status == 204 {
        return Value::Null;
    }
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    if is_json {
        if text.trim().is_empty() {
            return Value::Null;
        }
        return match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(status, error = %e, "response declared JSON but did not parse");
                Value::Null
            }
        };
    }
    Value::String(text)
}

fn transport_failure(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::new(ErrorCode::Timeout, ErrorCode::Timeout.default_message(0), 0)
    } else {
        ApiError::network(ErrorCode::NetworkError.default_message(0))
            .with_details(Value::String(e.to_string()))
    }
}
