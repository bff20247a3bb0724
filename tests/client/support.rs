//! Test backend that can refuse commits on demand.

use std::sync::atomic::{AtomicBool, Ordering};

use stored_rust::{BackendError, InMemoryBackend, Record, StorageBackend, WriteTransaction};

/// Wraps an `InMemoryBackend`; when armed, the next write transaction runs
/// to completion and is then refused, so every staged op is discarded.
pub struct FailingBackend {
    inner: InMemoryBackend,
    fail_next: AtomicBool,
}

impl FailingBackend {
    pub fn new() -> Self {
        FailingBackend {
            inner: InMemoryBackend::new(),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next_commit(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl StorageBackend for FailingBackend {
    fn write<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> Result<T, E>,
        E: From<BackendError>,
    {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return self.inner.write(|tx| {
                let _ = work(tx)?;
                Err(E::from(BackendError::Commit("injected failure".into())))
            });
        }
        self.inner.write(work)
    }

    fn scan(&self, collection: &str) -> Result<Vec<Record>, BackendError> {
        self.inner.scan(collection)
    }
}
