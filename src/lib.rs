//! yaml-content - YAML document storage with an ordered, nested field tree
//!
//! Documents are YAML mappings stored on named disks, with an index file
//! mapping a key field to a value field of every document. A document's
//! `form` sequence holds fields, which may nest child fields and are
//! addressed by dotted paths such as `0.1`.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{FieldError, FieldPath, FieldTree};
pub use storage::{DocumentError, DocumentStore, Project, Uploads};
