//! Live queries - subscriptions that re-emit matching result sets on change.
//!
//! A [`Subscription`] is created from a fetch specification: it receives the
//! current matching result set immediately, then a fresh snapshot after
//! every commit touching the collection, until cancelled. Consumption is
//! pull-based via [`poll`], in the same shape as a bus subscriber.
//!
//! Backends opt into live queries by implementing [`ObservableBackend`]:
//! registering a change listener per collection and releasing it again when
//! the subscription is cancelled.
//!
//! [`poll`]: Subscription::poll

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::backend::{BackendError, StorageBackend};
use crate::error::ClientError;

/// Callback invoked after a commit touches a watched collection. Receives
/// the ids written or deleted by that commit.
pub type ChangeListener = Box<dyn Fn(Vec<String>) + Send + Sync>;

/// Opaque handle identifying one registered change listener.
pub type WatchToken = String;

/// Backends that can notify about committed changes per collection.
pub trait ObservableBackend: StorageBackend {
    /// Register `listener` for commits touching `collection`.
    fn watch(&self, collection: &str, listener: ChangeListener)
        -> Result<WatchToken, BackendError>;

    /// Release a previously registered listener. Unknown tokens are a no-op.
    fn unwatch(&self, token: &WatchToken) -> Result<(), BackendError>;
}

struct QueueInner<M> {
    snapshots: Mutex<VecDeque<Vec<M>>>,
    wake: Condvar,
}

/// Thread-safe FIFO of result-set snapshots, fed by the backend's change
/// listener and drained by the subscription holder.
pub(crate) struct SnapshotQueue<M> {
    inner: Arc<QueueInner<M>>,
}

impl<M> Clone for SnapshotQueue<M> {
    fn clone(&self) -> Self {
        SnapshotQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> SnapshotQueue<M> {
    pub(crate) fn new() -> Self {
        SnapshotQueue {
            inner: Arc::new(QueueInner {
                snapshots: Mutex::new(VecDeque::new()),
                wake: Condvar::new(),
            }),
        }
    }

    pub(crate) fn push(&self, snapshot: Vec<M>) {
        match self.inner.snapshots.lock() {
            Ok(mut queue) => {
                queue.push_back(snapshot);
                self.inner.wake.notify_all();
            }
            Err(_) => log::warn!("snapshot queue lock poisoned; dropping snapshot"),
        }
    }

    fn pop_within(&self, timeout: Duration) -> Result<Option<Vec<M>>, ClientError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self
            .inner
            .snapshots
            .lock()
            .map_err(|_| ClientError::LockPoisoned("snapshot queue"))?;

        loop {
            if let Some(snapshot) = queue.pop_front() {
                return Ok(Some(snapshot));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let (guard, _) = self
                .inner
                .wake
                .wait_timeout(queue, deadline - now)
                .map_err(|_| ClientError::LockPoisoned("snapshot queue"))?;
            queue = guard;
        }
    }

    fn pop_now(&self) -> Result<Option<Vec<M>>, ClientError> {
        let mut queue = self
            .inner
            .snapshots
            .lock()
            .map_err(|_| ClientError::LockPoisoned("snapshot queue"))?;
        Ok(queue.pop_front())
    }
}

/// Live handle over one query: snapshots arrive on creation and after every
/// commit touching the collection, until [`cancel`]led.
///
/// Cancellation is idempotent and terminal; dropping the subscription
/// cancels it. Snapshots already queued can still be drained afterwards,
/// but no new ones arrive.
///
/// [`cancel`]: Subscription::cancel
pub struct Subscription<M> {
    queue: SnapshotQueue<M>,
    canceller: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(queue: SnapshotQueue<M>, canceller: Box<dyn FnOnce() + Send>) -> Self {
        Subscription {
            queue,
            canceller: Mutex::new(Some(canceller)),
        }
    }

    /// Wait up to `timeout_ms` for the next snapshot.
    /// Returns `Ok(None)` if no snapshot arrived in time.
    pub fn poll(&self, timeout_ms: u64) -> Result<Option<Vec<M>>, ClientError> {
        self.queue.pop_within(Duration::from_millis(timeout_ms))
    }

    /// Take the next snapshot if one is already queued, without blocking.
    pub fn try_next(&self) -> Result<Option<Vec<M>>, ClientError> {
        self.queue.pop_now()
    }

    /// Stop receiving snapshots and release the backend-side listener.
    /// Calling `cancel` again is a no-op.
    pub fn cancel(&self) {
        let canceller = match self.canceller.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                log::warn!("subscription cancel lock poisoned; listener may leak");
                None
            }
        };
        if let Some(release) = canceller {
            release();
        }
    }

    /// Whether this subscription has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.canceller
            .lock()
            .map(|slot| slot.is_none())
            .unwrap_or(true)
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.cancel();
    }
}
