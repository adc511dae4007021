//! `LocalStorage` - a string key/value map persisted to a JSON file.
//!
//! The demo backend keeps each user's collections here and the session store keeps
//! logged-in sessions here, the same way the browser console used `localStorage`.
//! Every write rewrites the whole file through a temporary file and a rename.

use crate::errors::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Shared handle to a key/value map, optionally backed by a file.
#[derive(Clone, Debug, Default)]
pub struct LocalStorage {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
}

impl LocalStorage {
    /// Storage that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (or starts) the storage file at `path`.
    ///
    /// A missing file is an empty store; an unreadable or malformed one is an error.
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self> {
        let entries = match tokio::fs::read_to_string(path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| Error::Storage {
                message: format!("Failed to parse storage file {}: {e}", path.display()),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(
            "Opened local storage at {} with {} keys",
            path.display(),
            entries.len()
        );

        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Raw value stored under `key`.
    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Stores `value` under `key` and flushes.
    pub async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await
    }

    /// Removes `key` and flushes; removing a missing key is a no-op.
    pub async fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    /// Decodes the JSON value under `key`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key).await {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` as JSON under `key`.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, raw).await
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(entries)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Flushed {} keys to {}", entries.len(), path.display());
        Ok(())
    }
}
