use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use super::{CollectionStore, StoreError};

/// JSON file-backed collection store.
///
/// Each collection lives in `<dir>/<name>.json`. Writes go to a temporary
/// sibling that is renamed over the target, so a reader never sees a
/// half-written file and a failed write keeps the previous contents.
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store rooted at `dir`, creating the directory if missing.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir.display().to_string(), e))?;
        Ok(Arc::new(Self { dir, write_lock: Mutex::new(()) }))
    }

    /// Directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidName(collection.to_string()));
        }
        Ok(self.dir.join(format!("{collection}.json")))
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load(&self, collection: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(collection)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(collection, e)),
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(collection, e))?;
        Ok(Some(value))
    }

    async fn save(&self, collection: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(collection)?;
        let data = serde_json::to_vec(&value).map_err(|e| StoreError::Encode(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock().await;
        if let Err(e) = fs::write(&tmp, &data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(collection, e));
        }
        fs::rename(&tmp, &path).await.map_err(|e| StoreError::io(collection, e))?;
        debug!(collection, bytes = data.len(), "collection saved");
        Ok(())
    }

    async fn remove(&self, collection: &str) -> Result<(), StoreError> {
        let path = self.path_for(collection)?;
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(collection, e)),
        }
    }
}
