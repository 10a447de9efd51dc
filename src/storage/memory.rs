//! In-memory blob store
//!
//! Used for tests and embedding. Paths are normalized the same way the
//! filesystem store normalizes them, so both behave identically.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::blob::{self, BlobStore, StoreError, StoreResult};

/// Blob store that keeps everything in a sorted map
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
    reject_writes: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write to a path containing `pattern` fail with
    /// [`StoreError::Rejected`]. `None` clears the simulation.
    pub fn reject_writes_matching(&self, pattern: Option<&str>) {
        *self
            .reject_writes
            .write()
            .unwrap_or_else(PoisonError::into_inner) = pattern.map(str::to_string);
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn key(path: &str) -> StoreResult<String> {
        let key = blob::normalize(path)?;
        if key.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(key)
    }
}

impl BlobStore for MemoryStore {
    fn exists(&self, path: &str) -> bool {
        match Self::key(path) {
            Ok(key) => self
                .blobs
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&key),
            Err(_) => false,
        }
    }

    fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let key = Self::key(path)?;
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let key = Self::key(path)?;

        let rejected = self
            .reject_writes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|pattern| key.contains(pattern));
        if rejected {
            return Err(StoreError::Rejected(key));
        }

        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<bool> {
        let key = Self::key(path)?;
        Ok(self
            .blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some())
    }

    fn list_files(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = blob::normalize(prefix)?;
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);

        Ok(blobs
            .keys()
            .filter(|key| {
                let parent = key.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
                parent == dir
            })
            .cloned()
            .collect())
    }
}
