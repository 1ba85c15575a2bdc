//! Offline handling: connectivity signal and the deferred-mutation queue.

mod connectivity;
mod queue;

pub use connectivity::{Connectivity, ConnectivityEvent};
pub use queue::{
    OfflineQueue, QueuedExecutor, QueuedRequest, QueuedResponse, DEFAULT_QUEUE_CAPACITY,
};
