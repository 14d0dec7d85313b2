//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before any store is opened.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory exists and is writable.
///
/// A missing directory is created. A path that exists but is not a directory
/// is an error, since every collection file lives beneath it.
pub async fn ensure_data_dir(data_dir: &Path) -> anyhow::Result<()> {
    match tokio::fs::metadata(data_dir).await {
        Ok(meta) if !meta.is_dir() => {
            return Err(anyhow::anyhow!("{} exists but is not a directory", data_dir.display()));
        }
        Ok(_) => {}
        Err(_) => {
            warn!(data_dir = %data_dir.display(), "data directory not found; creating it");
        }
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;

    let probe = data_dir.join(".write-probe");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("data directory {} is not writable: {e}", data_dir.display()))?;
    let _ = tokio::fs::remove_file(&probe).await;

    info!(data_dir = %data_dir.display(), "data directory ready");
    Ok(())
}
