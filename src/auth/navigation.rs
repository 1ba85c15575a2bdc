//! Login redirect hook used by session teardown.

/// Host-side navigation (browser location, desktop router, CLI prompt).
pub trait Navigator: Send + Sync {
    /// Path plus query of the current location, used as the post-login return target.
    fn current_location(&self) -> Option<String>;

    fn redirect(&self, target: &str);
}

/// Does nothing; the default for headless clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_location(&self) -> Option<String> {
        None
    }

    fn redirect(&self, target: &str) {
        tracing::debug!(target, "no navigator attached, skipping redirect");
    }
}

/// `{login_path}?redirect={encoded location}`, or the bare login path without a location.
pub fn login_redirect_url(login_path: &str, location: Option<&str>) -> String {
    match location.filter(|l| !l.is_empty()) {
        Some(location) => {
            let encoded: String = url::form_urlencoded::byte_serialize(location.as_bytes()).collect();
            format!("{}?redirect={}", login_path, encoded)
        }
        None => login_path.to_string(),
    }
}
