use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error_code::ErrorCode;
use crate::sdk::models::{Country, Currency, LocaleEntity};
use crate::types::{ApiEnvelope, ApiError, ApiResult, RequestOptions};
use crate::{Error, Result};

const LOCALES_PATH: &str = "/api/locales";

/// Public reference data. These endpoints never carry a bearer token.
#[derive(Debug, Clone)]
pub struct ReferenceApi {
    client: ApiClient,
}

impl ReferenceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn public<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResult<T>> {
        self.client.get(path, RequestOptions::new().public()).await
    }

    pub async fn locales(&self) -> Result<ApiResult<ApiEnvelope<Vec<LocaleEntity>>>> {
        self.public(LOCALES_PATH).await
    }

    pub async fn currencies(&self) -> Result<ApiResult<ApiEnvelope<Vec<Currency>>>> {
        self.public("/api/currencies").await
    }

    pub async fn countries(&self) -> Result<ApiResult<ApiEnvelope<Vec<Country>>>> {
        self.public("/api/countries").await
    }

    /// Active locales only.
    ///
    /// A failed request surfaces as [`Error::Api`]; so does a body without a `data` list.
    pub async fn fetch_active_locales(&self) -> Result<Vec<LocaleEntity>> {
        let body = self
            .public::<Value>(LOCALES_PATH)
            .await?
            .into_result()
            .map_err(|e| {
                tracing::error!(code = %e.code, status = e.status_code, "failed to fetch locales");
                Error::Api(e)
            })?;

        let envelope: ApiEnvelope<Vec<LocaleEntity>> = serde_json::from_value(body.clone())
            .map_err(|e| {
                tracing::error!(error = %e, "unexpected locales payload");
                Error::Api(
                    ApiError::new(
                        ErrorCode::Unknown,
                        "Invalid response format from /api/locales",
                        200,
                    )
                    .with_details(body),
                )
            })?;

        Ok(envelope.data.into_iter().filter(|l| l.is_active).collect())
    }

    /// [`Self::fetch_active_locales`], or `fallback` when it fails for any reason.
    pub async fn fetch_locales_with_fallback(
        &self,
        fallback: Vec<LocaleEntity>,
    ) -> Vec<LocaleEntity> {
        match self.fetch_active_locales().await {
            Ok(locales) => locales,
            Err(e) => {
                tracing::warn!(error = %e, "using fallback locales");
                fallback
            }
        }
    }
}
