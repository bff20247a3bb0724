//! ThreadedClient - background-thread execution for client operations.
//!
//! Wraps a [`PersistenceClient`] so each operation runs on its own worker
//! thread: the returned [`Task`] is pending when the call returns and is
//! resolved by the worker once the backend transaction finishes. Useful
//! when a backend does real I/O and the caller must not block.

use std::thread;

use crate::backend::StorageBackend;
use crate::error::ClientError;
use crate::fetch::FetchSpecification;
use crate::model::Model;
use crate::task::Task;

use super::{PersistenceClient, UpsertOutcome};

/// Runs every operation of a wrapped client on a background thread.
///
/// Batches are taken by value so they can move to the worker. Live queries
/// stay on the inner client (`inner().observable(...)`); they are already
/// push-driven and gain nothing from a worker thread.
pub struct ThreadedClient<B> {
    inner: PersistenceClient<B>,
}

impl<B> ThreadedClient<B>
where
    B: StorageBackend + Send + Sync + 'static,
{
    /// Wrap a client for background execution.
    pub fn new(inner: PersistenceClient<B>) -> Self {
        ThreadedClient { inner }
    }

    /// Access the wrapped client.
    pub fn inner(&self) -> &PersistenceClient<B> {
        &self.inner
    }

    /// [`PersistenceClient::insert`], resolved from a worker thread.
    pub fn insert<M: Model + 'static>(&self, models: Vec<M>) -> Task<Vec<M>> {
        self.run(move |client| client.insert(&models).wait())
    }

    /// [`PersistenceClient::update`], resolved from a worker thread.
    pub fn update<M: Model + 'static>(&self, models: Vec<M>) -> Task<Vec<M>> {
        self.run(move |client| client.update(&models).wait())
    }

    /// [`PersistenceClient::upsert`], resolved from a worker thread.
    pub fn upsert<M: Model + 'static>(&self, models: Vec<M>) -> Task<UpsertOutcome<M>> {
        self.run(move |client| client.upsert(&models).wait())
    }

    /// [`PersistenceClient::delete`], resolved from a worker thread.
    pub fn delete<M: Model + 'static>(&self, models: Vec<M>) -> Task<()> {
        self.run(move |client| client.delete(&models).wait())
    }

    /// [`PersistenceClient::execute`], resolved from a worker thread.
    pub fn execute<M: Model + 'static>(&self, request: FetchSpecification<M>) -> Task<Vec<M>> {
        self.run(move |client| client.execute(&request).wait())
    }

    fn run<T, F>(&self, work: F) -> Task<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(&PersistenceClient<B>) -> Result<T, ClientError> + Send + 'static,
    {
        let (task, resolver) = Task::pending();
        let client = self.inner.clone();
        thread::spawn(move || match work(&client) {
            Ok(value) => resolver.fulfill(value),
            Err(err) => resolver.fail(err),
        });
        task
    }
}
