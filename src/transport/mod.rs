//! Single-attempt HTTP executor and the tenant-id side channel it reads.

mod http;
pub mod tenant;

pub use http::{HttpTransport, TENANT_HEADER};
pub use tenant::{
    CookieTenantSource, KeyValueTenantSource, StaticTenantSource, TenantIdSource, TENANT_KEY,
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
