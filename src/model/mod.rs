//! Models - Typed application values that know how to persist themselves.
//!
//! A `Model` is a plain application value type that declares the mapping
//! capability the persistence client needs: a collection name, a stable
//! identity, and a conversion to and from the backend-native [`Record`].
//! The capability is a trait bound, so a type that cannot be persisted is a
//! compile error, never a runtime condition.
//!
//! ## Example
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use stored_rust::Model;
//!
//! #[derive(Serialize, Deserialize, Clone, PartialEq)]
//! struct Todo {
//!     pub id: String,
//!     pub title: String,
//!     pub done: bool,
//! }
//!
//! impl Model for Todo {
//!     const COLLECTION: &'static str = "todos";
//!     fn id(&self) -> &str { &self.id }
//! }
//! ```

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored through the persistence client.
///
/// Exactly one record shape corresponds to each model type: the serialized
/// form of the model itself, keyed by `COLLECTION` and `id()`.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "todos", "user_profiles").
    /// Maps to a table in SQL, a collection in document stores, a key prefix
    /// in KV stores, etc.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;

    /// Map this model to its backend record.
    fn to_record(&self) -> Result<Record, MappingError> {
        let bytes = serde_json::to_vec(self).map_err(|e| MappingError::Encode {
            collection: Self::COLLECTION.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Record::new(Self::COLLECTION, self.id(), bytes))
    }

    /// Reconstruct a model from its backend record.
    fn from_record(record: &Record) -> Result<Self, MappingError> {
        serde_json::from_slice(&record.bytes).map_err(|e| MappingError::Decode {
            collection: Self::COLLECTION.to_string(),
            detail: e.to_string(),
        })
    }
}

/// Backend-native representation of one persisted entity.
///
/// The client never inspects `bytes` except through [`Model::from_record`];
/// backends treat the whole record as opaque and key it by
/// `collection` + `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub collection: String,
    pub id: String,
    pub bytes: Vec<u8>,
}

impl Record {
    /// Create a record from its parts.
    pub fn new(collection: impl Into<String>, id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Record {
            collection: collection.into(),
            id: id.into(),
            bytes,
        }
    }

    /// The storage key for this record, `"collection:id"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.collection, self.id)
    }
}

/// Error type for model/record conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A model could not be serialized into a record.
    Encode { collection: String, detail: String },
    /// A record could not be deserialized back into a model.
    Decode { collection: String, detail: String },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::Encode { collection, detail } => {
                write!(f, "failed to encode model for {}: {}", collection, detail)
            }
            MappingError::Decode { collection, detail } => {
                write!(f, "failed to decode record from {}: {}", collection, detail)
            }
        }
    }
}

impl std::error::Error for MappingError {}
