//! Storage backends - the capability surface the client consumes.
//!
//! A backend exposes two things: scoped atomic write transactions and
//! ordered collection scans. The client owns no storage of its own; it
//! stages [`Record`]s into a [`WriteTransaction`] and lets the backend make
//! them visible all at once. Change notification is a separate, optional
//! capability (`ObservableBackend`, behind the `watch` feature).
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              PersistenceClient               │
//! │   maps models <-> records, stages batches    │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │            StorageBackend trait              │
//! │   write(|tx| ...) — atomic, all-or-nothing   │
//! │   scan(collection) — records ordered by id   │
//! └──────────────────────────────────────────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌─────────────────┐     ┌──────────────────────┐
//! │ InMemoryBackend │     │ disk/server backends │
//! │   (included)    │     │      (external)      │
//! └─────────────────┘     └──────────────────────┘
//! ```

mod in_memory;

use std::fmt;

use crate::model::Record;

pub use in_memory::InMemoryBackend;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The underlying store failed (poisoned lock, I/O failure, ...).
    Storage(String),
    /// A write transaction could not commit.
    Commit(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Storage(message) => write!(f, "storage error: {}", message),
            BackendError::Commit(message) => write!(f, "commit failed: {}", message),
        }
    }
}

impl std::error::Error for BackendError {}

/// One staged mutation inside a write transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Add or overwrite a record, matched by identity.
    Put(Record),
    /// Remove a record if present.
    Delete { collection: String, id: String },
}

/// Read view a backend hands to an open transaction, reflecting the state
/// the transaction started from.
pub trait TransactionView {
    /// Whether a record with this identity existed when the transaction
    /// opened.
    fn contains(&self, collection: &str, id: &str) -> Result<bool, BackendError>;
}

/// A write transaction: staged mutations plus a read view of the state the
/// transaction started from.
///
/// Nothing is applied while the transaction is open. [`contains`] answers
/// against the staged operations first, then the backend's view, so a
/// transaction observes its own writes.
///
/// [`contains`]: WriteTransaction::contains
pub struct WriteTransaction<'a> {
    view: &'a dyn TransactionView,
    ops: Vec<WriteOp>,
}

impl<'a> WriteTransaction<'a> {
    /// Open a transaction over a backend-provided view.
    pub fn new(view: &'a dyn TransactionView) -> Self {
        WriteTransaction {
            view,
            ops: Vec::new(),
        }
    }

    /// Stage a record write (add or overwrite by identity).
    pub fn put(&mut self, record: Record) {
        self.ops.push(WriteOp::Put(record));
    }

    /// Stage a record removal. Removing an absent record is a no-op.
    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) {
        self.ops.push(WriteOp::Delete {
            collection: collection.into(),
            id: id.into(),
        });
    }

    /// Whether a record with this identity exists from the transaction's
    /// point of view. Staged operations shadow the backend state.
    pub fn contains(&self, collection: &str, id: &str) -> Result<bool, BackendError> {
        for op in self.ops.iter().rev() {
            match op {
                WriteOp::Put(record) if record.collection == collection && record.id == id => {
                    return Ok(true);
                }
                WriteOp::Delete {
                    collection: staged_collection,
                    id: staged_id,
                } if staged_collection == collection && staged_id == id => {
                    return Ok(false);
                }
                _ => {}
            }
        }
        self.view.contains(collection, id)
    }

    /// The staged operations, in the order they were issued.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the transaction, yielding its staged operations for commit.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Abstract storage backend: atomic writes and ordered scans.
///
/// One backend handle is owned (and possibly shared) by a client instance;
/// the backend's own concurrency rules govern cross-client interleaving.
pub trait StorageBackend: Send + Sync {
    /// Run `work` inside one write transaction.
    ///
    /// Staged operations become visible all at once when `work` returns
    /// `Ok`; any `Err` discards every staged operation. The backend never
    /// applies a partial batch, and the transaction is released on every
    /// exit path. Backend-level commit failures surface as
    /// `E::from(BackendError)`.
    fn write<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> Result<T, E>,
        E: From<BackendError>;

    /// All records currently stored in `collection`, ordered by record id.
    fn scan(&self, collection: &str) -> Result<Vec<Record>, BackendError>;
}
