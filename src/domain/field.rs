//! Field tree engine
//!
//! A document keeps its fields as an ordered sequence under a configured key
//! (`form` by default). Container fields keep their children under a nested
//! `fields` sequence, so the tree is addressed with dotted [`FieldPath`]s.
//!
//! Every operation takes the document content and returns the updated
//! content; the input is never modified.
//!
//! ## Invariants
//!
//! - A field name never appears as any scalar value elsewhere in the tree
//! - A field's `name` never changes after it is inserted
//! - Update and delete only touch a field whose `type` matches the caller's

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::debug;

use super::content::{self, merge_shallow, str_attr};
use super::path::{resolve, resolve_mut, FieldPath, PathError, CHILDREN_KEY};

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("The field {0} already exists")]
    DuplicateFieldName(String),

    #[error("Field type {actual} cannot be type {expected}")]
    TypeMismatch { actual: String, expected: String },

    #[error("No field at path {0}")]
    PathNotFound(String),

    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("Field at {0} cannot hold child fields")]
    NotAContainer(String),

    #[error("Cannot move field {from} under its own descendant {to}")]
    CyclicParent { from: String, to: String },

    #[error("Field is missing its '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("Expected a mapping for {0}")]
    NotAMapping(&'static str),

    #[error("A field's name cannot be changed")]
    NameIsFixed,
}

/// Path-addressed operations over the field tree of a document
#[derive(Debug, Clone)]
pub struct FieldTree {
    fields_key: String,
}

impl FieldTree {
    /// Creates an engine for fields stored under `fields_key`
    pub fn new(fields_key: impl Into<String>) -> Self {
        Self {
            fields_key: fields_key.into(),
        }
    }

    /// Returns the key holding the root field sequence
    pub fn fields_key(&self) -> &str {
        &self.fields_key
    }

    /// Returns the root field sequence of `content`
    pub fn root<'a>(&self, content: &'a Value) -> Result<&'a [Value], FieldError> {
        content
            .as_mapping()
            .ok_or(FieldError::NotAMapping("content"))?
            .get(self.fields_key.as_str())
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .ok_or_else(|| FieldError::PathNotFound(self.fields_key.clone()))
    }

    /// Root sequence for writing. A missing or null sequence is created.
    fn root_mut<'a>(&self, content: &'a mut Value) -> Result<&'a mut Value, FieldError> {
        let map = content
            .as_mapping_mut()
            .ok_or(FieldError::NotAMapping("content"))?;

        children_of(map, &self.fields_key)
            .ok_or_else(|| FieldError::NotAContainer(self.fields_key.clone()))
    }

    /// Returns the field at `path` (e.g. `"0.1"`)
    pub fn get<'a>(&self, path: &str, content: &'a Value) -> Result<&'a Value, FieldError> {
        let path: FieldPath = path.parse()?;
        let root = content
            .as_mapping()
            .ok_or(FieldError::NotAMapping("content"))?
            .get(self.fields_key.as_str())
            .ok_or_else(|| FieldError::PathNotFound(path.to_string()))?;

        resolve(root, &path.segments()).ok_or_else(|| FieldError::PathNotFound(path.to_string()))
    }

    /// Inserts a new field, at the end of its parent's children or of the
    /// root sequence
    pub fn save(&self, field: &Value, content: &Value) -> Result<Value, FieldError> {
        let map = field.as_mapping().ok_or(FieldError::NotAMapping("field"))?;
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .ok_or(FieldError::MissingAttribute("name"))?;

        if self.name_taken(name, content) {
            return Err(FieldError::DuplicateFieldName(name.to_string()));
        }

        let parent = parent_path(map)?;
        let mut updated = content.clone();
        self.insert(&mut updated, parent.as_ref(), field.clone(), None)?;

        debug!(name, parent = ?parent.map(|p| p.to_string()), "inserted field");
        Ok(updated)
    }

    /// Applies `patch` to the field at `index`.
    ///
    /// A `parent` key in the patch moves the field: it is taken out of its
    /// current sequence and put back under the new parent, at the position
    /// given by the last segment of `index`.
    pub fn update(
        &self,
        field: &Value,
        patch: &Value,
        content: &Value,
        index: &str,
        expected_type: &str,
    ) -> Result<Value, FieldError> {
        ensure_type(field, expected_type)?;

        let original = field.as_mapping().ok_or(FieldError::NotAMapping("field"))?;
        let patch = patch.as_mapping().ok_or(FieldError::NotAMapping("patch"))?;

        let mut merged = original.clone();
        if !patch.contains_key("rules") {
            merged.shift_remove("rules");
        }
        merge_shallow(&mut merged, patch);
        if let Some(name) = original.get("name") {
            merged.insert(Value::from("name"), name.clone());
        }

        let path: FieldPath = index.parse()?;
        let mut updated = content.clone();

        if patch.contains_key("parent") {
            let parent = parent_path(&merged)?;
            if parent.is_none() {
                merged.shift_remove("parent");
            }

            self.remove(&mut updated, &path)?;

            let parent = match parent {
                Some(declared) => {
                    let shifted = declared.after_removal_of(&path).ok_or_else(|| {
                        FieldError::CyclicParent {
                            from: path.to_string(),
                            to: declared.to_string(),
                        }
                    })?;
                    // The stored parent must name the container the field ends up in
                    if shifted != declared {
                        merged.insert(Value::from("parent"), Value::from(shifted.to_string()));
                    }
                    Some(shifted)
                }
                None => None,
            };

            self.insert(
                &mut updated,
                parent.as_ref(),
                Value::Mapping(merged),
                Some(path.last()),
            )?;
            debug!(from = %path, to = ?parent.map(|p| p.to_string()), "moved field");
        } else {
            let root = self.root_mut(&mut updated)?;
            let slot = resolve_mut(root, &path.segments())
                .ok_or_else(|| FieldError::PathNotFound(path.to_string()))?;
            *slot = Value::Mapping(merged);
            debug!(path = %path, "updated field");
        }

        Ok(updated)
    }

    /// Removes the field at `index`. Later siblings move up by one.
    pub fn delete(
        &self,
        field: &Value,
        content: &Value,
        index: &str,
        expected_type: &str,
    ) -> Result<Value, FieldError> {
        ensure_type(field, expected_type)?;

        let path: FieldPath = index.parse()?;
        let mut updated = content.clone();
        self.remove(&mut updated, &path)?;

        debug!(path = %path, "deleted field");
        Ok(updated)
    }

    /// First field in a flat sequence whose `name` matches
    pub fn find<'a>(&self, name: &str, fields: &'a [Value]) -> Option<&'a Value> {
        fields.iter().find(|field| str_attr(field, "name") == Some(name))
    }

    /// True if `name` appears as any scalar value in the field tree
    pub fn name_taken(&self, name: &str, content: &Value) -> bool {
        let Some(root) = content
            .as_mapping()
            .and_then(|map| map.get(self.fields_key.as_str()))
        else {
            return false;
        };

        content::leaves(root)
            .into_iter()
            .any(|leaf| leaf.as_str() == Some(name))
    }

    /// Sets one attribute of the field at `index`, e.g. the stored path of
    /// an uploaded file
    pub fn set_attribute(
        &self,
        index: &str,
        attribute: &str,
        value: Value,
        content: &Value,
    ) -> Result<Value, FieldError> {
        if attribute == "name" {
            return Err(FieldError::NameIsFixed);
        }

        let path: FieldPath = index.parse()?;
        let mut updated = content.clone();

        let root = self.root_mut(&mut updated)?;
        let field = resolve_mut(root, &path.segments())
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| FieldError::PathNotFound(path.to_string()))?;
        field.insert(Value::from(attribute), value);

        debug!(path = %path, attribute, "set field attribute");
        Ok(updated)
    }

    /// Sequence holding the children of `parent`, or the root sequence.
    /// A container without children gets an empty `fields` sequence.
    fn siblings_mut<'a>(
        &self,
        content: &'a mut Value,
        parent: Option<&FieldPath>,
    ) -> Result<&'a mut Vec<Value>, FieldError> {
        let root = self.root_mut(content)?;

        let container = match parent {
            None => root,
            Some(parent) => {
                let node = resolve_mut(root, &parent.segments())
                    .ok_or_else(|| FieldError::PathNotFound(parent.to_string()))?;
                let map = node
                    .as_mapping_mut()
                    .ok_or_else(|| FieldError::NotAContainer(parent.to_string()))?;

                children_of(map, CHILDREN_KEY)
                    .ok_or_else(|| FieldError::NotAContainer(parent.to_string()))?
            }
        };

        container
            .as_sequence_mut()
            .ok_or_else(|| FieldError::NotAContainer(self.fields_key.clone()))
    }

    fn insert(
        &self,
        content: &mut Value,
        parent: Option<&FieldPath>,
        field: Value,
        slot: Option<usize>,
    ) -> Result<(), FieldError> {
        let siblings = self.siblings_mut(content, parent)?;

        match slot {
            Some(slot) => siblings.insert(slot.min(siblings.len()), field),
            None => siblings.push(field),
        }
        Ok(())
    }

    fn remove(&self, content: &mut Value, path: &FieldPath) -> Result<Value, FieldError> {
        let siblings = self.siblings_mut(content, path.parent().as_ref())?;

        if path.last() >= siblings.len() {
            return Err(FieldError::PathNotFound(path.to_string()));
        }
        Ok(siblings.remove(path.last()))
    }
}

/// Child sequence stored under `key`, created if missing or null.
/// Returns None if the key holds something other than a sequence.
fn children_of<'a>(map: &'a mut Mapping, key: &str) -> Option<&'a mut Value> {
    let key = Value::from(key);
    if map.get(&key).map_or(true, Value::is_null) {
        map.insert(key.clone(), Value::Sequence(Vec::new()));
    }

    map.get_mut(&key).filter(|children| children.is_sequence())
}

fn ensure_type(field: &Value, expected: &str) -> Result<(), FieldError> {
    let actual = str_attr(field, "type").unwrap_or_default();
    if actual != expected {
        return Err(FieldError::TypeMismatch {
            actual: actual.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Parent path declared by a field, if any
fn parent_path(field: &Mapping) -> Result<Option<FieldPath>, FieldError> {
    match field.get("parent") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => Ok(Some(FieldPath::try_from(value)?)),
    }
}
