//! Request execution: retry loop around a single authenticated attempt.

use std::sync::Arc;

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::AuthHandler;
use crate::client::error_classification::is_unauthorized;
use crate::client::policy::RetryController;
use crate::transport::HttpTransport;
use crate::types::{ApiResult, RequestConfig};

/// Runs one logical request: each retry attempt looks up the token, sends once and
/// recovers a 401 through refresh and replay.
#[derive(Debug)]
pub(crate) struct RequestPipeline {
    transport: Arc<HttpTransport>,
    auth: Arc<AuthHandler>,
    retry: Arc<RetryController>,
}

impl RequestPipeline {
    pub(crate) fn new(
        transport: Arc<HttpTransport>,
        auth: Arc<AuthHandler>,
        retry: Arc<RetryController>,
    ) -> Self {
        Self {
            transport,
            auth,
            retry,
        }
    }

    pub(crate) async fn run(&self, config: &RequestConfig) -> ApiResult<Value> {
        let span = tracing::debug_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %config.method,
            url = %config.url,
        );
        async {
            let result = self
                .retry
                .execute_with_default_policy(
                    |attempt| self.attempt(config, attempt),
                    config.retry.as_ref(),
                )
                .await;
            match &result {
                ApiResult::Success { status, .. } => tracing::debug!(status, "request succeeded"),
                ApiResult::Failure { error, status } => {
                    tracing::debug!(status, code = %error.code, "request failed")
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn attempt(&self, config: &RequestConfig, attempt: u32) -> ApiResult<Value> {
        tracing::trace!(attempt, "sending attempt");
        let token = if config.skip_auth {
            None
        } else {
            self.auth.get_token().await
        };

        let result = self.transport.execute(config, token.as_deref()).await;
        if config.skip_auth || result.is_success() || !is_unauthorized(result.status()) {
            return result;
        }

        self.auth
            .handle_unauthorized(config, |fresh| async move {
                self.transport.execute(config, Some(fresh.as_str())).await
            })
            .await
    }
}
