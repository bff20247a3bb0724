mod backend;
mod client;
mod error;
mod fetch;
mod model;
mod task;
#[cfg(feature = "watch")]
mod watch;

pub use backend::{
    BackendError, InMemoryBackend, StorageBackend, TransactionView, WriteOp, WriteTransaction,
};
pub use client::{PersistenceClient, ThreadedClient, UpsertOutcome};
pub use error::ClientError;
pub use fetch::{page_bounds, FetchSpecification, FilterFn, SortDirection, SortRule};
pub use model::{MappingError, Model, Record};
pub use task::{Task, TaskResolver};
#[cfg(feature = "watch")]
pub use watch::{ChangeListener, ObservableBackend, Subscription, WatchToken};
