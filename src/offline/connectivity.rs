use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::observer::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// Online/offline signal fed by the host (network monitor, browser bridge, tests).
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
    events: Subject<ConnectivityEvent>,
}

impl Connectivity {
    /// Starts online; without a host signal the environment is assumed reachable.
    pub fn new() -> Arc<Self> {
        Self::with_initial(true)
    }

    pub fn with_initial(online: bool) -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(online),
            events: Subject::new(),
        })
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn is_offline(&self) -> bool {
        !self.is_online()
    }

    /// Record the current state. Listeners hear about transitions only; returns whether
    /// the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        tracing::info!(?event, "connectivity changed");
        self.events.notify(&event);
        true
    }

    pub fn events(&self) -> &Subject<ConnectivityEvent> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn publishes_transitions_only() {
        let connectivity = Connectivity::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        connectivity
            .events()
            .subscribe(move |e| s.lock().unwrap().push(*e));

        assert!(!connectivity.set_online(true));
        assert!(connectivity.set_online(false));
        assert!(!connectivity.set_online(false));
        assert!(connectivity.is_offline());
        assert!(connectivity.set_online(true));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ConnectivityEvent::Offline, ConnectivityEvent::Online]
        );
    }
}
