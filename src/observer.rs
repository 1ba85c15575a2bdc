//! Minimal subject/observer used for auth, connectivity and activity events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by [`Subject::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Fan-out point for events of type `T`.
///
/// Listeners run synchronously on the notifying thread, in subscription order. The
/// listener list is snapshotted before fan-out, so a listener may subscribe or unsubscribe
/// (itself included) while being notified; changes apply from the next `notify`.
pub struct Subject<T> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
}

impl<T> Subject<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed (or was already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn notify(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn fans_out_in_order() {
        let subject = Subject::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            subject.subscribe(move |v: &u32| seen.lock().unwrap().push(format!("{}{}", tag, v)));
        }
        subject.notify(&1);
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let subject = Subject::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = subject.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        subject.notify(&());
        assert!(subject.unsubscribe(id));
        assert!(!subject.unsubscribe(id));
        subject.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(subject.listener_count(), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let subject = Arc::new(Subject::<()>::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let id = {
            let weak = Arc::downgrade(&subject);
            let slot = Arc::clone(&slot);
            let hits = Arc::clone(&hits);
            subject.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                let id = *slot.lock().unwrap();
                if let (Some(s), Some(id)) = (weak.upgrade(), id) {
                    s.unsubscribe(id);
                }
            })
        };
        *slot.lock().unwrap() = Some(id);

        subject.notify(&());
        subject.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
