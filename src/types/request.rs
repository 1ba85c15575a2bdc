//! Request description handed through interceptors, queue and executor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::RetryConfig;

/// HTTP verbs the backend API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Everything except GET. Mutating requests are deferred while offline.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description of one logical request.
///
/// A config is never mutated while a request is in flight: interceptors take it by value
/// and hand back a new one, and every retry attempt reads the same instance.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub url: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: BTreeMap<String, String>,
    /// Attach the `X-Enterprise-ID` tenant header.
    pub include_tenant_id: bool,
    /// Cancelling this token aborts the attempt with `CANCELLED`.
    pub cancel: Option<CancellationToken>,
    /// Per-request override of the client's retry config.
    pub retry: Option<RetryConfig>,
    /// Public endpoint: no token lookup, no `Authorization`, no refresh on 401.
    pub skip_auth: bool,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            headers: BTreeMap::new(),
            include_tenant_id: false,
            cancel: None,
            retry: None,
            skip_auth: false,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_tenant_id(mut self, include: bool) -> Self {
        self.include_tenant_id = include;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }

    /// Merge per-call options on top of this config.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.headers.extend(options.headers);
        self.include_tenant_id = options.include_tenant_id;
        self.cancel = options.cancel;
        self.retry = options.retry;
        self.skip_auth = options.skip_auth;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }
}

/// Per-call knobs accepted by the verb methods.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub include_tenant_id: bool,
    pub cancel: Option<CancellationToken>,
    pub retry: Option<RetryConfig>,
    pub skip_auth: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn tenant_scoped(mut self) -> Self {
        self.include_tenant_id = true;
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn public(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}
