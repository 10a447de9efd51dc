//! YAML document storage
//!
//! Documents are stored as `{folder}/{name}.yaml` on a blob store.
//! An index file (`{folder}/{index}.yaml`) maps each document's key field
//! to its value field, e.g. `uuid -> title`, for fast listing.
//!
//! The document write and the index write are two separate blob writes.
//! If the second one fails the index is stale for that document until the
//! next save or delete touching it.

use std::sync::Arc;

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::blob::{self, BlobStore, StoreError};
use super::codec::{CodecError, YamlCodec};
use super::config::IndexConfig;
use crate::domain::content::merge_shallow;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document {0} is not a mapping")]
    NotAMapping(String),

    #[error("Document has no '{0}' field to index by")]
    MissingIndexKey(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

const EXTENSION: &str = ".yaml";

/// Store for YAML documents plus their index
pub struct DocumentStore {
    disk: Arc<dyn BlobStore>,
    folder: String,
    codec: YamlCodec,
    index: IndexConfig,
}

impl DocumentStore {
    /// Creates a store writing below `folder` on `disk`
    pub fn new(
        disk: Arc<dyn BlobStore>,
        folder: impl Into<String>,
        codec: YamlCodec,
        index: IndexConfig,
    ) -> Self {
        Self {
            disk,
            folder: folder.into(),
            codec,
            index,
        }
    }

    /// Returns the codec documents are written with
    pub fn codec(&self) -> &YamlCodec {
        &self.codec
    }

    /// Returns the blob path of a document
    pub fn document_path(&self, name: &str) -> String {
        blob::join(&self.folder, &format!("{}{}", name, EXTENSION))
    }

    /// Returns the blob path of the index
    pub fn index_path(&self) -> String {
        self.document_path(&self.index.file_name)
    }

    /// Checks if a document exists
    pub fn exists(&self, name: &str) -> bool {
        self.disk.exists(&self.document_path(name))
    }

    /// Reads a document
    pub fn get(&self, name: &str) -> Result<Value, DocumentError> {
        let path = self.document_path(name);
        if !self.disk.exists(&path) {
            return Err(DocumentError::NotFound(name.to_string()));
        }

        self.read(&path)
    }

    /// Reads the index, or an empty mapping if there is none yet
    pub fn index(&self) -> Result<Mapping, DocumentError> {
        let path = self.index_path();

        let value = match self.disk.get(&path) {
            Ok(bytes) => self.codec.decode_bytes(&bytes)?,
            Err(StoreError::NotFound(_)) => return Ok(Mapping::new()),
            Err(e) => return Err(e.into()),
        };

        match value {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            _ => Err(DocumentError::NotAMapping(self.index.file_name.clone())),
        }
    }

    /// Lists stored document names (without the index), sorted
    pub fn list(&self) -> Result<Vec<String>, DocumentError> {
        let mut names: Vec<String> = self
            .disk
            .list_files(&self.folder)?
            .iter()
            .filter_map(|path| blob::file_name(path).strip_suffix(EXTENSION))
            .filter(|name| *name != self.index.file_name)
            .map(str::to_string)
            .collect();

        names.sort();
        Ok(names)
    }

    /// Writes a document, replacing any previous content, and updates the
    /// index entry for it
    pub fn save(&self, name: &str, content: &Value) -> Result<(), DocumentError> {
        let (key, value) = self.index_entry(name, content)?;
        let path = self.document_path(name);

        // An earlier version may have been indexed under another key
        let stale = match self.disk.exists(&path) {
            true => self
                .read(&path)?
                .get(self.index.key.as_str())
                .cloned()
                .filter(|previous_key| *previous_key != key),
            false => None,
        };

        self.write(&path, content)?;
        debug!(name, path = %path, "saved document");

        self.upsert_index(key, value, stale)
    }

    /// Shallow-merges `partial` over the stored document and saves it
    pub fn update(&self, name: &str, partial: &Value) -> Result<(), DocumentError> {
        let mut content = match self.get(name)? {
            Value::Mapping(map) => map,
            _ => return Err(DocumentError::NotAMapping(name.to_string())),
        };
        let partial = partial
            .as_mapping()
            .ok_or_else(|| DocumentError::NotAMapping(name.to_string()))?;

        merge_shallow(&mut content, partial);
        self.save(name, &Value::Mapping(content))
    }

    /// Deletes a document and its index entry. The index file itself is
    /// removed once its last entry is gone.
    pub fn delete(&self, name: &str) -> Result<(), DocumentError> {
        let content = self.get(name)?;
        let path = self.document_path(name);

        self.disk.delete(&path)?;
        debug!(name, path = %path, "deleted document");

        let index_path = self.index_path();
        let _lock = self.disk.lock(&index_path)?;

        let mut index = self.index()?;
        match content.get(self.index.key.as_str()) {
            Some(key) => {
                index.shift_remove(key);
            }
            None => warn!(name, key = %self.index.key, "deleted document had no index key"),
        }

        if index.is_empty() {
            self.disk.delete(&index_path)?;
            debug!(path = %index_path, "removed empty index");
        } else {
            self.write(&index_path, &Value::Mapping(index))?;
        }

        Ok(())
    }

    /// Key and value a document is indexed under
    fn index_entry(&self, name: &str, content: &Value) -> Result<(Value, Value), DocumentError> {
        let map = content
            .as_mapping()
            .ok_or_else(|| DocumentError::NotAMapping(name.to_string()))?;

        let key = map
            .get(self.index.key.as_str())
            .cloned()
            .ok_or_else(|| DocumentError::MissingIndexKey(self.index.key.clone()))?;
        let value = map
            .get(self.index.value.as_str())
            .cloned()
            .unwrap_or(Value::Null);

        Ok((key, value))
    }

    /// Sets `index[key] = value`, dropping `stale` if given
    fn upsert_index(&self, key: Value, value: Value, stale: Option<Value>) -> Result<(), DocumentError> {
        let path = self.index_path();
        let _lock = self.disk.lock(&path)?;

        let mut index = self.index()?;
        if let Some(stale) = stale {
            index.shift_remove(&stale);
        }
        index.insert(key, value);

        self.write(&path, &Value::Mapping(index))
    }

    fn read(&self, path: &str) -> Result<Value, DocumentError> {
        let bytes = self.disk.get(path)?;
        Ok(self.codec.decode_bytes(&bytes)?)
    }

    fn write(&self, path: &str, content: &Value) -> Result<(), DocumentError> {
        let text = self.codec.encode(content)?;
        self.disk.put(path, text.as_bytes())?;
        Ok(())
    }
}
