use crate::client::ApiClient;
use crate::sdk::models::{CreateEnterpriseDto, Enterprise, UpdateEnterpriseDto};
use crate::types::{ApiEnvelope, ApiResult, RequestOptions};
use crate::Result;

const BASE_PATH: &str = "/api/enterprises";

/// Enterprises visible to the signed-in user.
#[derive(Debug, Clone)]
pub struct EnterprisesApi {
    client: ApiClient,
}

impl EnterprisesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<ApiResult<ApiEnvelope<Vec<Enterprise>>>> {
        self.client.get(BASE_PATH, RequestOptions::new()).await
    }

    pub async fn get(&self, id: &str) -> Result<ApiResult<ApiEnvelope<Enterprise>>> {
        self.client
            .get(&format!("{}/{}", BASE_PATH, id), RequestOptions::new())
            .await
    }

    /// The caller becomes the owner of the new enterprise.
    pub async fn create(
        &self,
        data: &CreateEnterpriseDto,
    ) -> Result<ApiResult<ApiEnvelope<Enterprise>>> {
        self.client.post(BASE_PATH, data, RequestOptions::new()).await
    }

    /// Owner/admin only.
    pub async fn update(
        &self,
        id: &str,
        data: &UpdateEnterpriseDto,
    ) -> Result<ApiResult<ApiEnvelope<Enterprise>>> {
        self.client
            .patch(&format!("{}/{}", BASE_PATH, id), data, RequestOptions::new())
            .await
    }
}
