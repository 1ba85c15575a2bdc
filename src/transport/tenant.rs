//! Side channels that supply the tenant (enterprise) id for `X-Enterprise-ID`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::Environment;

/// Cookie name and storage key holding the active enterprise id.
pub const TENANT_KEY: &str = "current_enterprise_id";

/// Supplies the tenant id attached to tenant-scoped requests.
pub trait TenantIdSource: Send + Sync {
    /// Current tenant id, or `None` when no enterprise is selected.
    fn tenant_id(&self) -> Option<String>;
}

/// Reads the tenant id from a `Cookie` header string (`a=1; current_enterprise_id=ent_1`).
#[derive(Debug, Default)]
pub struct CookieTenantSource {
    cookie_header: RwLock<String>,
}

impl CookieTenantSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_header(cookie_header: impl Into<String>) -> Self {
        Self {
            cookie_header: RwLock::new(cookie_header.into()),
        }
    }

    /// Replace the cookie jar snapshot, e.g. after the user switched enterprise.
    pub fn set_cookie_header(&self, cookie_header: impl Into<String>) {
        *self
            .cookie_header
            .write()
            .unwrap_or_else(|e| e.into_inner()) = cookie_header.into();
    }
}

impl TenantIdSource for CookieTenantSource {
    fn tenant_id(&self) -> Option<String> {
        let header = self.cookie_header.read().unwrap_or_else(|e| e.into_inner());
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TENANT_KEY)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Local key-value store, the development-mode side channel.
#[derive(Debug, Default)]
pub struct KeyValueTenantSource {
    store: RwLock<HashMap<String, String>>,
}

impl KeyValueTenantSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.store
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.store
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.store
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    /// Shorthand for storing the active enterprise id.
    pub fn set_tenant_id(&self, id: impl Into<String>) {
        self.set_item(TENANT_KEY, id);
    }
}

impl TenantIdSource for KeyValueTenantSource {
    fn tenant_id(&self) -> Option<String> {
        self.get_item(TENANT_KEY).filter(|v| !v.is_empty())
    }
}

/// Fixed tenant id, for services that act on behalf of one enterprise.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantSource(Option<String>);

impl StaticTenantSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TenantIdSource for StaticTenantSource {
    fn tenant_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Cookie in production, key-value store otherwise.
pub fn source_for_environment(environment: Environment) -> Arc<dyn TenantIdSource> {
    match environment {
        Environment::Production => Arc::new(CookieTenantSource::new()),
        Environment::Development => Arc::new(KeyValueTenantSource::new()),
    }
}
