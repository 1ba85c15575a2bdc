use crate::client::ApiClient;
use crate::sdk::models::{AddMemberDto, Member};
use crate::types::{ApiEnvelope, ApiResult, RequestOptions};
use crate::Result;

/// Team management for one enterprise (owner/admin only).
#[derive(Debug, Clone)]
pub struct MembersApi {
    client: ApiClient,
}

impl MembersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn members_path(enterprise_id: &str) -> String {
        format!("/api/enterprises/{}/members", enterprise_id)
    }

    /// Owner first, then admins.
    pub async fn list(&self, enterprise_id: &str) -> Result<ApiResult<ApiEnvelope<Vec<Member>>>> {
        self.client
            .get(&Self::members_path(enterprise_id), RequestOptions::new())
            .await
    }

    /// Fails with 404 for unregistered users and 409 for existing members.
    pub async fn add(
        &self,
        enterprise_id: &str,
        data: &AddMemberDto,
    ) -> Result<ApiResult<ApiEnvelope<Member>>> {
        self.client
            .post(&Self::members_path(enterprise_id), data, RequestOptions::new())
            .await
    }

    /// Answers 204 on success; removing the owner is rejected with 400.
    pub async fn remove(&self, enterprise_id: &str, user_id: &str) -> Result<ApiResult<()>> {
        self.client
            .delete(
                &format!("{}/{}", Self::members_path(enterprise_id), user_id),
                RequestOptions::new(),
            )
            .await
    }
}
