//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use enterprise_api_client::auth::{Navigator, Session, SessionProvider};
use enterprise_api_client::{ApiClient, ApiClientBuilder, RetryConfig};

/// Session backend whose token becomes `fresh` after a successful refresh.
pub struct TestSessionProvider {
    token: Mutex<Option<String>>,
    refresh_to: Option<String>,
    pub session_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub sign_outs: AtomicUsize,
}

impl TestSessionProvider {
    pub fn new(token: &str, refresh_to: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            refresh_to: refresh_to.map(str::to_string),
            session_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        })
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for TestSessionProvider {
    async fn get_session(&self) -> enterprise_api_client::Result<Option<Session>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.lock().unwrap().clone().map(Session::new))
    }

    async fn refresh_session(&self) -> enterprise_api_client::Result<Option<Session>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.refresh_to.clone();
        *self.token.lock().unwrap() = next.clone();
        Ok(next.map(Session::new))
    }

    async fn sign_out(&self) -> enterprise_api_client::Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Records every redirect target.
pub struct RecordingNavigator {
    location: Option<String>,
    pub redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> Arc<Self> {
        Arc::new(Self {
            location: Some(location.to_string()),
            redirects: Mutex::new(Vec::new()),
        })
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> Option<String> {
        self.location.clone()
    }

    fn redirect(&self, target: &str) {
        self.redirects.lock().unwrap().push(target.to_string());
    }
}

/// Millisecond backoff so retry tests stay fast.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 5,
        exponential: true,
    }
}

pub fn builder_for(server: &mockito::ServerGuard) -> ApiClientBuilder {
    ApiClient::builder()
        .base_url(server.url())
        .retry(fast_retry(3))
}

pub async fn wait_for_queue(client: &ApiClient, expected: usize) {
    for _ in 0..400 {
        if client.queue_size() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "queue size never reached {} (is {})",
        expected,
        client.queue_size()
    );
}
