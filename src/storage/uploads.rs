//! Uploaded file storage
//!
//! Files go to the public disk under a destination folder. Name clashes are
//! resolved by [`available_name`]; the stored path is what callers write
//! into a field attribute.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_yaml::Value;
use tracing::debug;

use super::blob::{self, BlobStore, StoreResult};
use crate::domain::available_name;
use crate::domain::content::str_attr;

/// A file handed in for storage
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a local file, keeping its file name as the original name
    pub fn from_path(path: &Path) -> Result<Self> {
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?;

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read upload: {}", path.display()))?;

        Ok(Self::new(original_name, bytes))
    }
}

/// Stores and removes uploads on the public disk
pub struct Uploads {
    disk: Arc<dyn BlobStore>,
}

impl Uploads {
    pub fn new(disk: Arc<dyn BlobStore>) -> Self {
        Self { disk }
    }

    /// Stores `file` in `destination` and returns its stored path.
    ///
    /// When `previous` names a field and attribute already holding a stored
    /// path, that file is deleted first.
    pub fn upload_file(
        &self,
        file: &UploadedFile,
        destination: &str,
        previous: Option<(&Value, &str)>,
    ) -> StoreResult<String> {
        if let Some((field, attribute)) = previous {
            self.delete_file(field, attribute)?;
        }

        let existing = self.disk.list_files(destination)?;
        let name = available_name(&file.original_name, &existing);

        let stored = self.disk.put_named(destination, &file.bytes, &name)?;
        debug!(original = %file.original_name, stored = %stored, "stored upload");

        Ok(stored)
    }

    /// Deletes the file whose path `field` holds under `attribute`.
    /// Returns `false` if there was nothing to delete.
    pub fn delete_file(&self, field: &Value, attribute: &str) -> StoreResult<bool> {
        if attribute.is_empty() {
            return Ok(false);
        }

        match str_attr(field, attribute) {
            Some(path) if !path.is_empty() => {
                let deleted = self.disk.delete(path)?;
                debug!(path, deleted, "deleted upload");
                Ok(deleted)
            }
            _ => Ok(false),
        }
    }

    /// Files currently stored in `destination`
    pub fn list(&self, destination: &str) -> StoreResult<Vec<String>> {
        let files = self.disk.list_files(destination)?;
        Ok(files
            .iter()
            .map(|path| blob::file_name(path).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::StoreError;
    use crate::storage::memory::MemoryStore;
    use tempfile::TempDir;

    fn uploads() -> (Arc<MemoryStore>, Uploads) {
        let disk = Arc::new(MemoryStore::new());
        (disk.clone(), Uploads::new(disk))
    }

    fn field(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn first_upload_keeps_name() {
        let (disk, uploads) = uploads();
        let file = UploadedFile::new("photo.jpg", b"jpeg".to_vec());

        let stored = uploads.upload_file(&file, "images", None).unwrap();

        assert_eq!(stored, "images/photo.jpg");
        assert_eq!(disk.get("images/photo.jpg").unwrap(), b"jpeg");
    }

    #[test]
    fn repeated_uploads_get_numbered() {
        let (_, uploads) = uploads();
        let file = UploadedFile::new("photo.jpg", b"jpeg".to_vec());

        let names: Vec<String> = (0..3)
            .map(|_| uploads.upload_file(&file, "images", None).unwrap())
            .collect();

        assert_eq!(
            names,
            vec!["images/photo.jpg", "images/photo_0.jpg", "images/photo_1.jpg"]
        );
        assert_eq!(
            uploads.list("images").unwrap(),
            vec!["photo.jpg", "photo_0.jpg", "photo_1.jpg"]
        );
    }

    #[test]
    fn repeated_short_extension_uploads_never_overwrite() {
        let (disk, uploads) = uploads();

        let names: Vec<String> = (0..3u8)
            .map(|i| {
                let file = UploadedFile::new("data.gz", vec![i]);
                uploads.upload_file(&file, "dumps", None).unwrap()
            })
            .collect();

        assert_eq!(names, vec!["dumps/data.gz", "dumps/data.gz_0", "dumps/data.gz_1"]);
        assert_eq!(disk.get("dumps/data.gz").unwrap(), vec![0]);
        assert_eq!(disk.get("dumps/data.gz_0").unwrap(), vec![1]);
        assert_eq!(disk.get("dumps/data.gz_1").unwrap(), vec![2]);
    }

    #[test]
    fn previous_file_is_replaced() {
        let (disk, uploads) = uploads();
        let old = uploads
            .upload_file(&UploadedFile::new("cv.pdf", b"v1".to_vec()), "docs", None)
            .unwrap();

        let holder = field(&format!("name: cv\ntype: file\nvalue: {}\n", old));
        let new = uploads
            .upload_file(
                &UploadedFile::new("cv.pdf", b"v2".to_vec()),
                "docs",
                Some((&holder, "value")),
            )
            .unwrap();

        assert_eq!(new, "docs/cv.pdf");
        assert_eq!(disk.get("docs/cv.pdf").unwrap(), b"v2");
        assert_eq!(disk.paths(), vec!["docs/cv.pdf"]);
    }

    #[test]
    fn delete_file_without_attribute_is_noop() {
        let (disk, uploads) = uploads();
        disk.put("docs/a.pdf", b"a").unwrap();
        let holder = field("name: a\nvalue: docs/a.pdf\n");

        assert!(!uploads.delete_file(&holder, "").unwrap());
        assert!(!uploads.delete_file(&holder, "missing").unwrap());
        assert!(disk.exists("docs/a.pdf"));

        assert!(uploads.delete_file(&holder, "value").unwrap());
        assert!(!disk.exists("docs/a.pdf"));
    }

    #[test]
    fn rejected_write_surfaces() {
        let (disk, uploads) = uploads();
        disk.reject_writes_matching(Some("images"));

        let result = uploads.upload_file(&UploadedFile::new("a.png", b"a".to_vec()), "images", None);
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[test]
    fn from_path_reads_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"pdf").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.original_name, "report.pdf");
        assert_eq!(file.bytes, b"pdf");
    }
}
