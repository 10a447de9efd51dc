//! Blob storage contract
//!
//! A blob store maps relative, `/`-separated paths to raw bytes. Document
//! files, the index file and uploaded files all live in blob stores; the
//! [`super::Disks`] registry hands them out by name.

use std::fs::File;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob path: '{0}'")]
    InvalidPath(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Write rejected for {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Advisory lock on a blob path, released when dropped
#[derive(Debug)]
pub struct BlobLock {
    _file: File,
}

impl BlobLock {
    pub(crate) fn new(file: File) -> Self {
        Self { _file: file }
    }
}

/// Byte storage addressed by relative paths.
///
/// Implementations must treat paths as relative to their own root and never
/// allow a path to escape it. Writes fully replace any previous value.
pub trait BlobStore: Send + Sync {
    /// Returns true if a blob exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Reads the blob at `path`, failing with [`StoreError::NotFound`] if absent
    fn get(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Writes `bytes` at `path`, overwriting any previous blob
    fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Deletes the blob at `path`. Returns `false` if nothing was there.
    fn delete(&self, path: &str) -> StoreResult<bool>;

    /// Lists the blobs directly inside `prefix` (not recursive), sorted
    fn list_files(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Writes `bytes` as `name` inside `prefix` and returns the stored path
    fn put_named(&self, prefix: &str, bytes: &[u8], name: &str) -> StoreResult<String> {
        let path = join(prefix, name);
        self.put(&path, bytes)?;
        Ok(path)
    }

    /// Takes an exclusive advisory lock for `path`, if the backend supports it
    fn lock(&self, _path: &str) -> StoreResult<Option<BlobLock>> {
        Ok(None)
    }
}

/// Normalizes a blob path: drops empty and `.` segments, rejects `..`
pub fn normalize(path: &str) -> StoreResult<String> {
    let mut segments = Vec::new();

    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(StoreError::InvalidPath(path.to_string())),
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Joins a prefix and a name into a blob path
pub fn join(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let name = name.trim_start_matches('/');

    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Returns the last segment of a blob path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
