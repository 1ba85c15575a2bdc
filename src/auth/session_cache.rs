//! TTL-bounded cache of resolved users, keyed by a token prefix.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::auth::User;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30);

const CACHE_KEY_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct CachedSession {
    pub user: Option<User>,
    pub expires_at_ms: u64,
    pub created_at_ms: u64,
}

impl CachedSession {
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCacheMetrics {
    pub size: usize,
    pub ttl_ms: u64,
}

/// Injected per client; cleared on sign-out.
#[derive(Debug)]
pub struct SessionCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSession>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `None` is a miss (absent or expired); `Some(None)` is a cached anonymous result.
    ///
    /// Expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<Option<User>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired_at(now_ms()),
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.user.clone())
    }

    /// Store `user` under `key`. Expired entries are pruned first, so keys of rotated
    /// tokens do not accumulate.
    pub fn set(&self, key: impl Into<String>, user: Option<User>) {
        let now = now_ms();
        let entry = CachedSession {
            user,
            expires_at_ms: now.saturating_add(self.ttl.as_millis() as u64),
            created_at_ms: now,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| !e.is_expired_at(now));
        entries.insert(key.into(), entry);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries; returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "session cache cleanup");
        }
        removed
    }

    pub fn metrics(&self) -> SessionCacheMetrics {
        SessionCacheMetrics {
            size: self.len(),
            ttl_ms: self.ttl.as_millis() as u64,
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for a token: its first 16 characters, or `"anonymous"`.
pub fn cache_key(token: &str) -> String {
    if token.is_empty() {
        return "anonymous".to_string();
    }
    token.chars().take(CACHE_KEY_LEN).collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            email: email.into(),
            ..User::default()
        }
    }

    #[test]
    fn distinguishes_miss_from_anonymous() {
        let cache = SessionCache::new();
        assert_eq!(cache.get("anonymous"), None);
        cache.set("anonymous", None);
        assert_eq!(cache.get("anonymous"), Some(None));
        cache.set("abc", Some(user("a@b.c")));
        assert_eq!(cache.get("abc"), Some(Some(user("a@b.c"))));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = SessionCache::with_ttl(Duration::from_millis(5));
        cache.set("k", Some(user("x@y.z")));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());

        cache.set("k2", None);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.cleanup(), 1);
    }

    #[test]
    fn set_prunes_expired_keys() {
        let cache = SessionCache::with_ttl(Duration::from_millis(5));
        cache.set("token-one-prefix", Some(user("a@b.c")));
        cache.set("token-two-prefix", Some(user("a@b.c")));
        std::thread::sleep(Duration::from_millis(20));

        cache.set("token-three-pref", Some(user("a@b.c")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_and_metrics() {
        let cache = SessionCache::new();
        cache.set("a", None);
        assert_eq!(
            cache.metrics(),
            SessionCacheMetrics {
                size: 1,
                ttl_ms: 30_000
            }
        );
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn key_is_token_prefix() {
        assert_eq!(cache_key(""), "anonymous");
        assert_eq!(cache_key("short"), "short");
        assert_eq!(cache_key("0123456789abcdefXYZ"), "0123456789abcdef");
    }
}
