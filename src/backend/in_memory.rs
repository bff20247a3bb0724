//! InMemoryBackend - BTreeMap-backed storage backend for testing and development.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[cfg(feature = "watch")]
use std::sync::Mutex;

#[cfg(feature = "watch")]
use event_emitter_rs::EventEmitter;

use crate::model::Record;

use super::{BackendError, StorageBackend, TransactionView, WriteOp, WriteTransaction};

#[cfg(feature = "watch")]
use crate::watch::{ChangeListener, ObservableBackend, WatchToken};

fn make_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

/// In-memory storage backend.
///
/// Records live in a `BTreeMap` keyed `"collection:id"`, so scans come back
/// ordered by id and pagination over an unsorted fetch is deterministic.
/// Clone-friendly via `Arc`: clones share storage and watchers.
#[derive(Clone)]
pub struct InMemoryBackend {
    storage: Arc<RwLock<BTreeMap<String, Record>>>,
    #[cfg(feature = "watch")]
    emitter: Arc<Mutex<EventEmitter>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        InMemoryBackend {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            #[cfg(feature = "watch")]
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    /// Total number of records across all collections.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether the backend holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(feature = "watch")]
    fn notify(&self, touched: BTreeMap<String, Vec<String>>) {
        if touched.is_empty() {
            return;
        }
        match self.emitter.lock() {
            Ok(mut emitter) => {
                for (collection, ids) in touched {
                    emitter.emit(&collection, ids);
                }
            }
            Err(_) => log::warn!("change emitter lock poisoned; dropping commit notifications"),
        }
    }
}

struct MapView<'m>(&'m BTreeMap<String, Record>);

impl TransactionView for MapView<'_> {
    fn contains(&self, collection: &str, id: &str) -> Result<bool, BackendError> {
        Ok(self.0.contains_key(&make_key(collection, id)))
    }
}

impl StorageBackend for InMemoryBackend {
    fn write<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> Result<T, E>,
        E: From<BackendError>,
    {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| E::from(BackendError::Storage("lock poisoned".into())))?;

        let view = MapView(&storage);
        let mut tx = WriteTransaction::new(&view);
        let value = work(&mut tx)?;
        let ops = tx.into_ops();
        let op_count = ops.len();

        #[cfg(feature = "watch")]
        let mut touched: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for op in ops {
            match op {
                WriteOp::Put(record) => {
                    #[cfg(feature = "watch")]
                    touched
                        .entry(record.collection.clone())
                        .or_default()
                        .push(record.id.clone());
                    storage.insert(record.key(), record);
                }
                WriteOp::Delete { collection, id } => {
                    storage.remove(&make_key(&collection, &id));
                    #[cfg(feature = "watch")]
                    touched.entry(collection).or_default().push(id);
                }
            }
        }

        drop(storage);

        if op_count > 0 {
            log::debug!("committed {} write op(s)", op_count);
        }

        #[cfg(feature = "watch")]
        self.notify(touched);

        Ok(value)
    }

    fn scan(&self, collection: &str) -> Result<Vec<Record>, BackendError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BackendError::Storage("lock poisoned".into()))?;

        let prefix = format!("{}:", collection);
        Ok(storage
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[cfg(feature = "watch")]
impl ObservableBackend for InMemoryBackend {
    fn watch(&self, collection: &str, listener: ChangeListener) -> Result<WatchToken, BackendError> {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| BackendError::Storage("change emitter lock poisoned".into()))?;
        Ok(emitter.on(collection, move |ids: Vec<String>| listener(ids)))
    }

    fn unwatch(&self, token: &WatchToken) -> Result<(), BackendError> {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| BackendError::Storage("change emitter lock poisoned".into()))?;
        emitter.remove_listener(token);
        Ok(())
    }
}
