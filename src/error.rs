use std::fmt;

use crate::backend::BackendError;
use crate::model::MappingError;

/// Top-level error type for persistence client operations.
///
/// Every failure surfaces through a task's failure slot; no operation
/// silently drops an item or aborts the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A model could not be converted to or from its backend record.
    Mapping(String),
    /// The backend rejected a transaction or read.
    Backend(BackendError),
    /// An update referenced a record that does not exist.
    NotFound { collection: String, id: String },
    /// A client-side lock was poisoned by a panicking thread.
    LockPoisoned(&'static str),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Mapping(message) => write!(f, "mapping error: {}", message),
            ClientError::Backend(err) => write!(f, "backend error: {}", err),
            ClientError::NotFound { collection, id } => {
                write!(f, "record not found: {}:{}", collection, id)
            }
            ClientError::LockPoisoned(what) => {
                write!(f, "client lock poisoned during {}", what)
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<MappingError> for ClientError {
    fn from(err: MappingError) -> Self {
        ClientError::Mapping(err.to_string())
    }
}

impl From<BackendError> for ClientError {
    fn from(err: BackendError) -> Self {
        ClientError::Backend(err)
    }
}
