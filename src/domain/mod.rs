//! Domain logic for yaml-content
//!
//! Pure transformations over document content, without any I/O.

pub mod content;
mod field;
mod path;
mod upload;

pub use field::{FieldError, FieldTree};
pub use path::{resolve, translate, FieldPath, PathError, Segment, CHILDREN_KEY};
pub use upload::{available_name, split_extension};
