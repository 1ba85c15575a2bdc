use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Authenticated user as reported by the session backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A live session. Only `access_token` is required by the client.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }
}

// Tokens stay out of Debug output so they never reach the logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Session backend the client consumes (OAuth/password auth service).
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current session, `None` when signed out.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Exchange the refresh credential for a new session.
    async fn refresh_session(&self) -> Result<Option<Session>>;

    async fn sign_out(&self) -> Result<()>;

    /// Resolve the user behind `access_token`. Defaults to the current session's user.
    async fn get_user(&self, _access_token: &str) -> Result<Option<User>> {
        Ok(self.get_session().await?.and_then(|s| s.user))
    }
}

/// Provider for anonymous clients: never has a session, refresh always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionProvider;

#[async_trait]
impl SessionProvider for NoSessionProvider {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}
