//! Typed wrappers over the backend's enterprise, member and reference-data endpoints.
//!
//! ```rust,no_run
//! use enterprise_api_client::{ApiClient, ApiResult};
//!
//! # async fn run() -> enterprise_api_client::Result<()> {
//! let client = ApiClient::new("https://api.example.com")?;
//! match client.enterprises().list().await? {
//!     ApiResult::Success { data, .. } => println!("{} enterprises", data.data.len()),
//!     ApiResult::Failure { error, .. } => eprintln!("{}", error),
//! }
//! # Ok(())
//! # }
//! ```

mod enterprises;
mod members;
pub mod models;
mod reference;

pub use enterprises::EnterprisesApi;
pub use members::MembersApi;
pub use models::{
    AddMemberDto, Country, CreateEnterpriseDto, Currency, Enterprise, EnterpriseStatus,
    LocaleEntity, Member, MemberStatus, UpdateEnterpriseDto, UserRole,
};
pub use reference::ReferenceApi;

use crate::client::ApiClient;

impl ApiClient {
    pub fn enterprises(&self) -> EnterprisesApi {
        EnterprisesApi::new(self.clone())
    }

    pub fn members(&self) -> MembersApi {
        MembersApi::new(self.clone())
    }

    pub fn reference(&self) -> ReferenceApi {
        ReferenceApi::new(self.clone())
    }
}
