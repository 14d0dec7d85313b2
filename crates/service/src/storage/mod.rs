//! Storage port for the service layer.
//!
//! State lives in a handful of named collections, each persisted as one JSON
//! value. Stores read the whole collection, change it in memory and write it
//! back in full; adapters only need `load`, `save` and `remove`.

pub mod json_file_store;
pub mod memory_store;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;

/// Names of the persisted collections.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SESSION: &str = "session";
    pub const ITEMS: &str = "items";
    pub const REVOKED_TOKENS: &str = "revoked_tokens";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {collection}: {reason}")]
    Io { collection: String, reason: String },
    #[error("collection {collection} is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("invalid collection name: {0}")]
    InvalidName(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(collection: &str, e: impl std::fmt::Display) -> Self {
        Self::Io { collection: collection.to_string(), reason: e.to_string() }
    }

    pub(crate) fn corrupt(collection: &str, e: impl std::fmt::Display) -> Self {
        Self::Corrupt { collection: collection.to_string(), reason: e.to_string() }
    }
}

/// Durable load/save of named collections.
///
/// Implementations can be file-backed, in-memory, or a database table per
/// collection. A `save` must either fully replace the stored value or leave
/// the previous one untouched.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Current value of `collection`, or `None` when it was never written.
    async fn load(&self, collection: &str) -> Result<Option<Value>, StoreError>;
    /// Replace `collection` with `value`.
    async fn save(&self, collection: &str, value: Value) -> Result<(), StoreError>;
    /// Drop `collection`; succeeds when it is already absent.
    async fn remove(&self, collection: &str) -> Result<(), StoreError>;
}

/// Load a sequence collection; a missing collection is empty.
pub async fn load_vec<T>(store: &dyn CollectionStore, collection: &str) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
{
    match store.load(collection).await? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v).map_err(|e| StoreError::corrupt(collection, e)),
    }
}

/// Load a single-record collection.
pub async fn load_opt<T>(store: &dyn CollectionStore, collection: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    match store.load(collection).await? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v).map(Some).map_err(|e| StoreError::corrupt(collection, e)),
    }
}

/// Serialize `value` and replace `collection` with it.
pub async fn save_value<T>(store: &dyn CollectionStore, collection: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + Sync + ?Sized,
{
    let encoded = serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))?;
    store.save(collection, encoded).await
}
