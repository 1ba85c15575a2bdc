//! In-flight request counter, the backing store of a global loading indicator.

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::observer::{Subject, SubscriptionId};

/// Counts outstanding operations and publishes every change of the count.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    count: Mutex<usize>,
    changes: Subject<usize>,
}

impl ActivityTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark one operation as started. The returned guard ends it on drop.
    pub fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.adjust(|c| c + 1);
        ActivityGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Run `fut` while counted as active.
    pub async fn track<F: Future>(self: &Arc<Self>, fut: F) -> F::Output {
        let _guard = self.begin();
        fut.await
    }

    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.count() > 0
    }

    /// Subscribe to count changes; `listener` is called right away with the current count.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&usize) + Send + Sync + 'static,
    {
        listener(&self.count());
        self.changes.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    fn adjust(&self, f: impl FnOnce(usize) -> usize) {
        let current = {
            let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
            *count = f(*count);
            *count
        };
        self.changes.notify(&current);
    }
}

/// Ends one tracked operation when dropped.
#[derive(Debug)]
pub struct ActivityGuard {
    tracker: Arc<ActivityTracker>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.tracker.adjust(|c| c.saturating_sub(1));
    }
}
