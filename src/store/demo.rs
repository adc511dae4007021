//! Demo-mode backend: per-user JSON collections in [`LocalStorage`].
//!
//! Each collection is stored under `lumanet_{table}_{owner}` as a JSON array. A
//! save removes the record with the same id and appends the new version.

use super::{Backend, LocalStorage, Record, Table};
use crate::errors::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Backend used when no database is configured.
#[derive(Clone, Debug)]
pub struct DemoBackend {
    storage: LocalStorage,
    latency: Duration,
    // Serialises read-modify-write cycles on the collections
    write_lock: Arc<Mutex<()>>,
}

impl DemoBackend {
    /// Wraps a storage handle with no simulated latency.
    #[must_use]
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            latency: Duration::ZERO,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Adds a delay before every operation, to behave like a remote API.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Underlying storage, shared with the session store.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Storage key of one owner's collection.
    #[must_use]
    pub fn storage_key(table: Table, owner_id: &str) -> String {
        format!("lumanet_{}_{}", table.name(), owner_id)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn load<R: Record>(&self, key: &str) -> Result<Vec<R>> {
        Ok(self.storage.get_json(key).await?.unwrap_or_default())
    }
}

impl Backend for DemoBackend {
    #[instrument(skip(self, record), fields(table = %R::TABLE, id = record.id()))]
    async fn upsert<R: Record>(&self, owner_id: &str, record: &R) -> Result<R> {
        self.simulate_latency().await;
        let key = Self::storage_key(R::TABLE, owner_id);
        let mut stored = record.clone();
        stored.set_owner_id(owner_id);

        let _guard = self.write_lock.lock().await;
        let mut records: Vec<R> = self.load(&key).await?;
        records.retain(|existing| existing.id() != stored.id());
        records.push(stored.clone());
        self.storage.set_json(&key, &records).await?;
        debug!("Saved record into {key} ({} records)", records.len());
        Ok(stored)
    }

    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn list<R: Record>(&self, owner_id: &str) -> Result<Vec<R>> {
        self.simulate_latency().await;
        let key = Self::storage_key(R::TABLE, owner_id);
        self.load(&key).await
    }

    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn delete<R: Record>(&self, owner_id: &str, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let key = Self::storage_key(R::TABLE, owner_id);

        let _guard = self.write_lock.lock().await;
        let mut records: Vec<R> = self.load(&key).await?;
        let before = records.len();
        records.retain(|existing| existing.id() != id);
        if records.len() != before {
            self.storage.set_json(&key, &records).await?;
            debug!("Deleted {id} from {key}");
        }
        Ok(())
    }
}
