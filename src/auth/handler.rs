use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::auth::navigation::login_redirect_url;
use crate::auth::session_cache::cache_key;
use crate::auth::{Navigator, SessionCache, SessionProvider, User};
use crate::error_code::ErrorCode;
use crate::observer::Subject;
use crate::types::{ApiError, ApiResult, RequestConfig};

/// Message returned when a 401 could not be recovered by refreshing.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// Auth state changes published by [`AuthHandler::events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    TokenRefreshed,
    RefreshFailed,
    SignedOut,
}

/// Result of one refresh round. `round` identifies the refresh that produced it.
#[derive(Debug, Clone)]
struct RefreshOutcome {
    round: u64,
    token: Option<String>,
}

type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;
type RefreshSlot = Arc<Mutex<Option<RefreshFuture>>>;

/// Supplies bearer tokens and recovers from 401s.
///
/// Refresh is single-flight: while one refresh is running, every caller of
/// [`AuthHandler::refresh_token`] awaits that same refresh and sees its outcome. The
/// in-flight slot is emptied by the refresh itself when it settles, whether it succeeded
/// or not, so a later 401 always starts a fresh refresh.
///
/// A failed refresh tears the session down once, however many requests were waiting on it.
pub struct AuthHandler {
    provider: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
    cache: Arc<SessionCache>,
    login_path: String,
    refresh_slot: RefreshSlot,
    refresh_rounds: AtomicU64,
    torn_down_round: AtomicU64,
    events: Arc<Subject<AuthEvent>>,
}

impl AuthHandler {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
        cache: Arc<SessionCache>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            navigator,
            cache,
            login_path: login_path.into(),
            refresh_slot: Arc::new(Mutex::new(None)),
            refresh_rounds: AtomicU64::new(0),
            torn_down_round: AtomicU64::new(0),
            events: Arc::new(Subject::new()),
        }
    }

    pub fn events(&self) -> &Subject<AuthEvent> {
        &self.events
    }

    pub fn session_cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Access token of the current session, `None` when there is none.
    pub async fn get_token(&self) -> Option<String> {
        match self.provider.get_session().await {
            Ok(session) => session
                .map(|s| s.access_token)
                .filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get_token().await.is_some()
    }

    /// User behind the current token, served from the session cache while fresh.
    pub async fn current_user(&self) -> Option<User> {
        let token = self.get_token().await;
        let key = cache_key(token.as_deref().unwrap_or_default());
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let user = match token {
            Some(token) => match self.provider.get_user(&token).await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to resolve current user");
                    return None;
                }
            },
            None => None,
        };
        self.cache.set(key, user.clone());
        user
    }

    /// Refresh the session, joining a refresh that is already in flight.
    pub async fn refresh_token(&self) -> Option<String> {
        self.refresh().await.token
    }

    async fn refresh(&self) -> RefreshOutcome {
        let refresh = {
            let mut slot = self.refresh_slot.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(in_flight) => {
                    tracing::debug!("joining in-flight token refresh");
                    in_flight.clone()
                }
                None => {
                    let refresh = self.start_refresh();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }

    fn start_refresh(&self) -> RefreshFuture {
        let round = self.refresh_rounds.fetch_add(1, Ordering::SeqCst) + 1;
        let provider = Arc::clone(&self.provider);
        let slot = Arc::clone(&self.refresh_slot);
        let events = Arc::clone(&self.events);

        async move {
            tracing::info!("refreshing session");
            let token = match provider.refresh_session().await {
                Ok(Some(session)) if !session.access_token.is_empty() => Some(session.access_token),
                Ok(_) => {
                    tracing::warn!("refresh returned no session");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "session refresh failed");
                    None
                }
            };

            slot.lock().unwrap_or_else(|e| e.into_inner()).take();

            events.notify(if token.is_some() {
                &AuthEvent::TokenRefreshed
            } else {
                &AuthEvent::RefreshFailed
            });
            RefreshOutcome { round, token }
        }
        .boxed()
        .shared()
    }

    /// Recover from a 401: refresh once, then replay the request once with the new token.
    ///
    /// The replay's outcome is returned as-is, so a second 401 is final. When the refresh
    /// fails the session is torn down and a terminal `UNAUTHORIZED` result is returned.
    pub async fn handle_unauthorized<T, F, Fut>(
        &self,
        config: &RequestConfig,
        replay: F,
    ) -> ApiResult<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let outcome = self.refresh().await;
        match outcome.token {
            Some(token) => {
                tracing::debug!(method = %config.method, url = %config.url, "replaying with refreshed token");
                replay(token).await
            }
            None => {
                if self.torn_down_round.fetch_max(outcome.round, Ordering::SeqCst) < outcome.round {
                    self.teardown().await;
                } else {
                    tracing::debug!(round = outcome.round, "session already torn down for this refresh");
                }
                ApiResult::failure(ApiError::new(
                    ErrorCode::Unauthorized,
                    SESSION_EXPIRED_MESSAGE,
                    401,
                ))
            }
        }
    }

    /// Clear local session state, sign out, then send the user to the login entry point.
    pub async fn teardown(&self) {
        self.cache.clear();
        if let Err(e) = self.provider.sign_out().await {
            tracing::error!(error = %e, "sign out failed");
        }
        self.events.notify(&AuthEvent::SignedOut);

        let location = self.navigator.current_location();
        let target = login_redirect_url(&self.login_path, location.as_deref());
        tracing::info!(target = %target, "session ended, redirecting to login");
        self.navigator.redirect(&target);
    }
}

impl std::fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHandler")
            .field("login_path", &self.login_path)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
