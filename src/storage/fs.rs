//! Local filesystem blob store
//!
//! Blobs are plain files below a root directory. Writes are atomic
//! (temp file + rename) and locks use `fs2` advisory file locks on a
//! hidden sibling `.{name}.lock` file.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::blob::{self, BlobLock, BlobStore, StoreError, StoreResult};

/// Blob store backed by a directory on disk
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a blob path to a file path below the root
    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = blob::normalize(path)?;
        if relative.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Hidden sibling file with the given suffix, e.g. `.doc.yaml.tmp`
    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}", name, suffix))
    }

    fn is_internal(name: &str) -> bool {
        name.starts_with('.') && (name.ends_with(".tmp") || name.ends_with(".lock"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl BlobStore for FsStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let file = self.resolve(path)?;

        match fs::read(&file) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path.to_string())),
            Err(e) => Err(io_error(&file)(e)),
        }
    }

    fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let file = self.resolve(path)?;

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        // Write to temp file first
        let temp = Self::sibling(&file, "tmp");
        fs::write(&temp, bytes).map_err(io_error(&temp))?;

        // Atomic rename
        fs::rename(&temp, &file).map_err(io_error(&file))?;

        debug!(path, bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<bool> {
        let file = self.resolve(path)?;

        match fs::remove_file(&file) {
            Ok(()) => {
                debug!(path, "deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&file)(e)),
        }
    }

    fn list_files(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let relative = blob::normalize(prefix)?;
        let dir = self.root.join(&relative);

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_error(&dir))? {
            let entry = entry.map_err(io_error(&dir))?;
            if !entry.path().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::is_internal(&name) {
                continue;
            }

            files.push(blob::join(&relative, &name));
        }

        files.sort();
        Ok(files)
    }

    fn lock(&self, path: &str) -> StoreResult<Option<BlobLock>> {
        let file = self.resolve(path)?;

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let lock_path = Self::sibling(&file, "lock");
        let handle = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error(&lock_path))?;

        // Released when the handle is dropped
        handle.lock_exclusive().map_err(io_error(&lock_path))?;

        Ok(Some(BlobLock::new(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_and_get_blob() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        store.put("common/doc.yaml", b"title: Test\n").unwrap();

        assert!(store.exists("common/doc.yaml"));
        assert_eq!(store.get("common/doc.yaml").unwrap(), b"title: Test\n");
        assert!(dir.path().join("common").join("doc.yaml").is_file());
    }

    #[test]
    fn get_missing_blob_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        assert!(!store.exists("missing.yaml"));
        assert!(matches!(
            store.get("missing.yaml"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn atomic_write_no_temp_file_left() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        store.put("common/doc.yaml", b"a: 1\n").unwrap();

        let temp = dir.path().join("common").join(".doc.yaml.tmp");
        assert!(!temp.exists(), "Temp file should be removed after atomic write");
    }

    #[test]
    fn delete_reports_whether_blob_existed() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        store.put("a.txt", b"x").unwrap();

        assert!(store.delete("a.txt").unwrap());
        assert!(!store.delete("a.txt").unwrap());
        assert!(!store.exists("a.txt"));
    }

    #[test]
    fn list_files_skips_directories_and_lock_files() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        store.put("uploads/b.png", b"b").unwrap();
        store.put("uploads/a.png", b"a").unwrap();
        store.put("uploads/nested/c.png", b"c").unwrap();
        let _lock = store.lock("uploads/a.png").unwrap();

        let files = store.list_files("/uploads").unwrap();
        assert_eq!(files, vec!["uploads/a.png", "uploads/b.png"]);
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        assert!(store.list_files("nothing/here").unwrap().is_empty());
    }

    #[test]
    fn paths_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path().join("root"));

        assert!(matches!(
            store.put("../outside.txt", b"x"),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(!store.exists("../outside.txt"));
    }

    #[test]
    fn put_named_returns_stored_path() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        let stored = store.put_named("uploads", b"data", "photo.jpg").unwrap();
        assert_eq!(stored, "uploads/photo.jpg");
        assert!(store.exists("uploads/photo.jpg"));
    }
}
