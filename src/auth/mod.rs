//! Bearer-token supply, single-flight refresh and session teardown.

mod handler;
pub mod navigation;
mod provider;
pub mod session_cache;

pub use handler::{AuthEvent, AuthHandler, SESSION_EXPIRED_MESSAGE};
pub use navigation::{login_redirect_url, Navigator, NoopNavigator};
pub use provider::{NoSessionProvider, Session, SessionProvider, User};
pub use session_cache::{cache_key, CachedSession, SessionCache, SessionCacheMetrics};
