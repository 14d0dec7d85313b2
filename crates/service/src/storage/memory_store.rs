use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{CollectionStore, StoreError};

/// In-memory collection store for tests and ephemeral deployments.
///
/// Saves to selected collections can be made to fail, which lets callers
/// check that a failed operation leaves earlier state in place.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `save`/`remove` on `collection` fail.
    pub fn fail_writes_to(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection.to_string());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(collection))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Unavailable(format!("writes to {collection} disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self, collection: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.inner.read().await.get(collection).cloned())
    }

    async fn save(&self, collection: &str, value: Value) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        self.inner.write().await.insert(collection.to_string(), value);
        Ok(())
    }

    async fn remove(&self, collection: &str) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        self.inner.write().await.remove(collection);
        Ok(())
    }
}
