use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::BoxFuture;
use rand::Rng;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::observer::SubscriptionId;
use crate::offline::{Connectivity, ConnectivityEvent};
use crate::types::{ApiResult, RequestConfig};
use crate::{Error, Result};

pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Deferred network call: runs the original request through the full pipeline.
pub type QueuedExecutor = Box<dyn FnOnce() -> BoxFuture<'static, ApiResult<Value>> + Send>;

type Responder = oneshot::Sender<Result<ApiResult<Value>>>;

/// A mutating request waiting for connectivity.
pub struct QueuedRequest {
    pub id: String,
    pub config: RequestConfig,
    pub enqueued_at_ms: u64,
    executor: QueuedExecutor,
    responder: Responder,
}

impl std::fmt::Debug for QueuedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedRequest")
            .field("id", &self.id)
            .field("method", &self.config.method)
            .field("url", &self.config.url)
            .field("enqueued_at_ms", &self.enqueued_at_ms)
            .finish()
    }
}

/// Resolves once the queued request has been executed, or with
/// [`Error::QueueCleared`] when the queue was cleared first.
#[derive(Debug)]
pub struct QueuedResponse {
    id: String,
    rx: oneshot::Receiver<Result<ApiResult<Value>>>,
}

impl QueuedResponse {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for QueuedResponse {
    type Output = Result<ApiResult<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::QueueCleared)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bounded FIFO of mutating requests issued while offline.
///
/// A full queue rejects new entries instead of evicting old ones. Going back online
/// drains the queue in enqueue order; the drain stops as soon as the client is offline
/// again and leaves the remaining entries queued.
pub struct OfflineQueue {
    capacity: usize,
    entries: Mutex<VecDeque<QueuedRequest>>,
    connectivity: Arc<Connectivity>,
    draining: AtomicBool,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl OfflineQueue {
    /// Create the queue and start draining it on every `Online` transition.
    pub fn new(capacity: usize, connectivity: Arc<Connectivity>) -> Arc<Self> {
        let queue = Arc::new(Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
            connectivity: Arc::clone(&connectivity),
            draining: AtomicBool::new(false),
            subscription: Mutex::new(None),
        });

        let weak: Weak<OfflineQueue> = Arc::downgrade(&queue);
        let id = connectivity.events().subscribe(move |event| {
            if *event != ConnectivityEvent::Online {
                return;
            }
            if let Some(queue) = weak.upgrade() {
                queue.spawn_drain();
            }
        });
        *queue
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(id);
        queue
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_offline(&self) -> bool {
        self.connectivity.is_offline()
    }

    /// Queue `executor` for later. Fails immediately when the queue is at capacity.
    ///
    /// Connectivity is checked again after the entry is stored: if the client came back
    /// online in the meantime, a drain is started so the entry does not wait for the next
    /// transition.
    pub fn enqueue(
        self: &Arc<Self>,
        config: RequestConfig,
        executor: QueuedExecutor,
    ) -> Result<QueuedResponse> {
        let response = self.push(config, executor)?;
        if self.connectivity.is_online() {
            tracing::debug!(id = %response.id, "back online while queueing, draining");
            Arc::clone(self).spawn_drain();
        }
        Ok(response)
    }

    fn push(&self, config: RequestConfig, executor: QueuedExecutor) -> Result<QueuedResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            tracing::warn!(
                method = %config.method,
                url = %config.url,
                capacity = self.capacity,
                "offline queue full, rejecting request"
            );
            return Err(Error::QueueFull {
                capacity: self.capacity,
            });
        }

        let (tx, rx) = oneshot::channel();
        let id = generate_id();
        tracing::info!(
            id = %id,
            method = %config.method,
            url = %config.url,
            queue_size = entries.len() + 1,
            "offline, request queued"
        );
        entries.push_back(QueuedRequest {
            id: id.clone(),
            config,
            enqueued_at_ms: now_ms(),
            executor,
            responder: tx,
        });
        Ok(QueuedResponse { id, rx })
    }

    /// Execute queued requests in FIFO order. Returns how many were executed.
    ///
    /// A drain that is already running makes this call a no-op. Entries that arrive while
    /// the running drain is finishing are picked up before it returns.
    pub async fn drain(&self) -> usize {
        let mut executed = 0;
        loop {
            if self.draining.swap(true, Ordering::SeqCst) {
                tracing::debug!("offline queue drain already running");
                break;
            }
            {
                let _reset = DrainFlag(&self.draining);
                executed += self.drain_pending().await;
            }
            if self.connectivity.is_offline() || self.is_empty() {
                break;
            }
        }

        if executed > 0 {
            tracing::info!(executed, "offline queue drained");
        }
        executed
    }

    async fn drain_pending(&self) -> usize {
        let mut executed = 0;
        loop {
            if self.connectivity.is_offline() {
                tracing::info!(remaining = self.len(), "went offline during drain, pausing");
                break;
            }
            let next = self
                .entries
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            let Some(entry) = next else { break };

            tracing::debug!(id = %entry.id, method = %entry.config.method, url = %entry.config.url, "replaying queued request");
            let outcome = (entry.executor)().await;
            if entry.responder.send(Ok(outcome)).is_err() {
                tracing::debug!(id = %entry.id, "caller stopped waiting for queued request");
            }
            executed += 1;
        }
        executed
    }

    /// Reject every pending entry with [`Error::QueueCleared`]. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let pending: Vec<QueuedRequest> = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        let count = pending.len();
        for entry in pending {
            let _ = entry.responder.send(Err(Error::QueueCleared));
        }
        if count > 0 {
            tracing::info!(count, "offline queue cleared");
        }
        count
    }

    fn spawn_drain(self: Arc<Self>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    self.drain().await;
                });
            }
            Err(_) => tracing::warn!(
                queue_size = self.len(),
                "back online outside a tokio runtime, call drain_queue to replay"
            ),
        }
    }
}

impl Drop for OfflineQueue {
    fn drop(&mut self) {
        let id = self
            .subscription
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(id) = id {
            self.connectivity.events().unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("draining", &self.draining.load(Ordering::Relaxed))
            .finish()
    }
}

struct DrainFlag<'a>(&'a AtomicBool);

impl Drop for DrainFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// `{unix_ms}-{9 random base36 chars}`
fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", now_ms(), suffix)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
