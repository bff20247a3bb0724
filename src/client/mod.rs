//! PersistenceClient - uniform CRUD + query + live-query facade over one
//! storage backend.
//!
//! The client maps application models to backend records, stages one atomic
//! write transaction per batch call, and maps query results back into
//! models. Every operation returns a [`Task`]; failures surface only
//! through the task's failure slot, never past the call boundary.
//!
//! ## Example
//!
//! ```ignore
//! use stored_rust::{FetchSpecification, InMemoryBackend, PersistenceClient};
//!
//! let client = PersistenceClient::new(InMemoryBackend::new());
//!
//! client.insert(&[todo_a, todo_b]).wait()?;
//!
//! let open = client
//!     .execute(&FetchSpecification::new().filter(|t: &Todo| !t.done))
//!     .wait()?;
//! ```

mod threaded;

use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::ClientError;
use crate::fetch::{page_bounds, FetchSpecification};
use crate::model::{Model, Record};
use crate::task::Task;

pub use threaded::ThreadedClient;

#[cfg(feature = "watch")]
use crate::watch::{ObservableBackend, SnapshotQueue, Subscription};

/// The result of an upsert batch: which models were newly created and which
/// overwrote an existing record.
#[derive(Debug, Clone)]
pub struct UpsertOutcome<M> {
    pub inserted: Vec<M>,
    pub updated: Vec<M>,
}

/// Uniform CRUD + query facade over a pluggable storage backend.
///
/// Cloning the client is cheap and shares the backend handle; the backend's
/// own rules govern concurrent use.
pub struct PersistenceClient<B> {
    backend: Arc<B>,
}

impl<B> Clone for PersistenceClient<B> {
    fn clone(&self) -> Self {
        PersistenceClient {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StorageBackend> PersistenceClient<B> {
    /// Create a client owning its backend handle.
    pub fn new(backend: B) -> Self {
        PersistenceClient {
            backend: Arc::new(backend),
        }
    }

    /// Create a client over an already shared backend handle.
    pub fn shared(backend: Arc<B>) -> Self {
        PersistenceClient { backend }
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Persist `models`, adding or overwriting records by identity, in one
    /// atomic transaction. Resolves with the input models on success.
    pub fn insert<M: Model>(&self, models: &[M]) -> Task<Vec<M>> {
        Task::settled(self.write_overwrite(models))
    }

    /// Overwrite records for `models`, requiring every one of them to
    /// already exist. A missing record fails the whole batch with
    /// `NotFound` and commits nothing.
    pub fn update<M: Model>(&self, models: &[M]) -> Task<Vec<M>> {
        Task::settled(self.write_checked(models))
    }

    /// Persist `models` in one atomic transaction, reporting which records
    /// were newly created and which overwrote an existing one. Existence is
    /// checked against the transaction's own view, so a batch writing the
    /// same identity twice counts the second write as an update.
    pub fn upsert<M: Model>(&self, models: &[M]) -> Task<UpsertOutcome<M>> {
        Task::settled(self.write_partitioned(models))
    }

    /// Remove the records for `models` in one atomic transaction.
    /// Idempotent in effect: absent records are skipped without error.
    pub fn delete<M: Model>(&self, models: &[M]) -> Task<()> {
        let result = self.backend.write(|tx| {
            for model in models {
                tx.delete(M::COLLECTION, model.id());
            }
            Ok::<_, ClientError>(())
        });
        Task::settled(result)
    }

    /// Fetch the models matching `request`.
    ///
    /// The filter runs first, then the sort, then offset/limit pagination,
    /// so a page is always a window into the full ordered result set.
    /// Unsorted results come back in record-id order.
    pub fn execute<M: Model>(&self, request: &FetchSpecification<M>) -> Task<Vec<M>> {
        Task::settled(run_fetch(self.backend.as_ref(), request))
    }

    /// Open a live query for `request`: the current result set is queued
    /// immediately, and a fresh snapshot is queued after every commit
    /// touching the collection, until the subscription is cancelled.
    #[cfg(feature = "watch")]
    pub fn observable<M>(&self, request: FetchSpecification<M>) -> Result<Subscription<M>, ClientError>
    where
        M: Model + 'static,
        B: ObservableBackend + 'static,
    {
        let queue = SnapshotQueue::new();
        queue.push(run_fetch(self.backend.as_ref(), &request)?);

        let backend = Arc::clone(&self.backend);
        let feed = queue.clone();
        let token = self.backend.watch(
            M::COLLECTION,
            Box::new(move |_changed_ids: Vec<String>| match run_fetch(backend.as_ref(), &request) {
                Ok(snapshot) => feed.push(snapshot),
                Err(err) => log::warn!("live query refresh failed for {}: {}", M::COLLECTION, err),
            }),
        )?;

        let backend = Arc::clone(&self.backend);
        Ok(Subscription::new(
            queue,
            Box::new(move || {
                if let Err(err) = backend.unwatch(&token) {
                    log::warn!("failed to release watch on {}: {}", M::COLLECTION, err);
                }
            }),
        ))
    }

    fn write_overwrite<M: Model>(&self, models: &[M]) -> Result<Vec<M>, ClientError> {
        let records = map_records(models)?;
        self.backend.write(|tx| {
            for record in records {
                tx.put(record);
            }
            Ok::<_, ClientError>(())
        })?;
        Ok(models.to_vec())
    }

    fn write_checked<M: Model>(&self, models: &[M]) -> Result<Vec<M>, ClientError> {
        let records = map_records(models)?;
        self.backend.write(|tx| {
            for record in records {
                if !tx.contains(&record.collection, &record.id)? {
                    return Err(ClientError::NotFound {
                        collection: record.collection,
                        id: record.id,
                    });
                }
                tx.put(record);
            }
            Ok(())
        })?;
        Ok(models.to_vec())
    }

    fn write_partitioned<M: Model>(&self, models: &[M]) -> Result<UpsertOutcome<M>, ClientError> {
        let records = map_records(models)?;
        self.backend.write(|tx| {
            let mut inserted = Vec::new();
            let mut updated = Vec::new();
            for (model, record) in models.iter().zip(records) {
                if tx.contains(&record.collection, &record.id)? {
                    updated.push(model.clone());
                } else {
                    inserted.push(model.clone());
                }
                tx.put(record);
            }
            Ok(UpsertOutcome { inserted, updated })
        })
    }
}

/// Map a batch of models to records up front, so a mapping failure aborts
/// the call before any transaction opens.
fn map_records<M: Model>(models: &[M]) -> Result<Vec<Record>, ClientError> {
    let mut records = Vec::with_capacity(models.len());
    for model in models {
        records.push(model.to_record()?);
    }
    Ok(records)
}

/// Evaluate a fetch specification against a backend: scan, decode, filter,
/// sort, paginate.
pub(crate) fn run_fetch<B, M>(backend: &B, request: &FetchSpecification<M>) -> Result<Vec<M>, ClientError>
where
    B: StorageBackend + ?Sized,
    M: Model,
{
    let records = backend.scan(M::COLLECTION)?;

    let mut models = Vec::with_capacity(records.len());
    for record in &records {
        models.push(M::from_record(record)?);
    }

    if let Some(filter) = &request.filter {
        models.retain(|model| filter(model));
    }
    if let Some(sort) = &request.sort {
        models.sort_by(|a, b| sort.ordering(a, b));
    }

    let range = page_bounds(models.len(), request.offset, request.limit);
    Ok(models[range].to_vec())
}
