//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare the data
//! directory and open the stores through `service` alone.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::auth::{IdentityStore, TokenRevocations};
use crate::listings::ListingStore;
use crate::storage::{CollectionStore, JsonFileStore};

/// Ensure the data directory exists and is writable.
pub async fn ensure_env(data_dir: &Path) -> anyhow::Result<()> {
    common::env::ensure_data_dir(data_dir).await
}

/// Stores opened over one shared collection store.
pub struct Stores {
    pub identity: Arc<IdentityStore>,
    pub listings: Arc<ListingStore>,
    pub revocations: Arc<TokenRevocations>,
}

/// Open every store on top of `store`.
pub async fn open_stores(store: Arc<dyn CollectionStore>, max_image_url_len: usize) -> anyhow::Result<Stores> {
    let identity = IdentityStore::open(store.clone()).await?;
    let revocations = TokenRevocations::open(store.clone()).await?;
    let listings = ListingStore::new(store, max_image_url_len);
    Ok(Stores {
        identity: Arc::new(identity),
        listings: Arc::new(listings),
        revocations: Arc::new(revocations),
    })
}

/// Prepare `data_dir` and open file-backed stores in it.
pub async fn open_file_stores(data_dir: &Path, max_image_url_len: usize) -> anyhow::Result<Stores> {
    ensure_env(data_dir).await?;
    let files = JsonFileStore::new(data_dir).await?;
    info!(data_dir = %files.dir().display(), "file-backed stores opened");
    open_stores(files, max_image_url_len).await
}
