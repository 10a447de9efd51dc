//! Dotted field paths
//!
//! Path Format:
//! - Root field: `{index}` (e.g., `0`)
//! - Nested field: `{index}.{child}` (e.g., `0.1` is child 1 of root field 0)
//!
//! Children are stored under a `fields` key of their container, so a path
//! is translated into storage hops by putting a literal `fields` hop between
//! every pair of indexes: `0.1` becomes `0`, `fields`, `1`.

use std::fmt;
use std::str::FromStr;

use serde_yaml::Value;
use thiserror::Error;

/// Key under which a container field keeps its children
pub const CHILDREN_KEY: &str = "fields";

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("Invalid field path: '{0}'")]
    InvalidPath(String),

    #[error("Invalid path segment '{segment}' in '{path}'")]
    InvalidSegment { path: String, segment: String },

    #[error("Field path {0} must be quoted")]
    UnquotedPath(String),
}

/// Splits a dotted path into storage hops, with a `fields` hop between
/// every pair of positions
pub fn translate(path: &str) -> Vec<String> {
    let complete: Vec<&str> = path.split('.').collect();
    let dotted = complete.join(&format!(".{}.", CHILDREN_KEY));
    dotted.split('.').map(str::to_string).collect()
}

/// One hop through stored content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Index(usize),
    Key(String),
}

impl Segment {
    fn from_hop(hop: &str) -> Self {
        match hop.parse::<usize>() {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Key(hop.to_string()),
        }
    }
}

/// Position of a field in the tree, e.g. `0.1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    positions: Vec<usize>,
}

impl FieldPath {
    /// Number of positions; root fields have depth 1
    pub fn depth(&self) -> usize {
        self.positions.len()
    }

    /// Position within the containing sequence
    pub fn last(&self) -> usize {
        self.positions[self.positions.len() - 1]
    }

    /// Path of the containing field, or None for root fields
    pub fn parent(&self) -> Option<FieldPath> {
        if self.positions.len() <= 1 {
            return None;
        }
        Some(FieldPath {
            positions: self.positions[..self.positions.len() - 1].to_vec(),
        })
    }

    /// True if `other` is this path or lies below it
    pub fn contains(&self, other: &FieldPath) -> bool {
        other.positions.starts_with(&self.positions)
    }

    /// Storage hops relative to the root field sequence
    pub fn segments(&self) -> Vec<Segment> {
        translate(&self.to_string())
            .iter()
            .map(|hop| Segment::from_hop(hop))
            .collect()
    }

    /// Where this path points after the field at `removed` is taken out of
    /// its sequence. Returns None if this path was inside the removed field.
    pub fn after_removal_of(&self, removed: &FieldPath) -> Option<FieldPath> {
        if removed.contains(self) {
            return None;
        }

        let level = removed.depth() - 1;
        let mut positions = self.positions.clone();

        if positions.len() > level
            && positions[..level] == removed.positions[..level]
            && positions[level] > removed.positions[level]
        {
            positions[level] -= 1;
        }

        Some(FieldPath { positions })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.positions.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", position)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathError::InvalidPath(s.to_string()));
        }

        let positions: Result<Vec<usize>, _> = s
            .split('.')
            .map(|p| {
                p.parse::<usize>().map_err(|_| PathError::InvalidSegment {
                    path: s.to_string(),
                    segment: p.to_string(),
                })
            })
            .collect();

        Ok(Self {
            positions: positions?,
        })
    }
}

impl TryFrom<&Value> for FieldPath {
    type Error = PathError;

    /// Reads a path stored as a field attribute. YAML hands back an
    /// unquoted `0` as an integer, which is accepted. An unquoted `1.10`
    /// is a float that has already lost its trailing zero, so nested
    /// paths must be quoted.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => match n.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(index) => Ok(Self {
                    positions: vec![index],
                }),
                None => Err(PathError::UnquotedPath(n.to_string())),
            },
            other => Err(PathError::InvalidPath(format!("{:?}", other))),
        }
    }
}

/// Follows `segments` from `root`
pub fn resolve<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match segment {
        Segment::Index(i) => node.as_sequence()?.get(*i),
        Segment::Key(key) => node.as_mapping()?.get(key.as_str()),
    })
}

/// Follows `segments` from `root`, mutably
pub fn resolve_mut<'a>(root: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    segments.iter().try_fold(root, |node, segment| match segment {
        Segment::Index(i) => node.as_sequence_mut()?.get_mut(*i),
        Segment::Key(key) => node.as_mapping_mut()?.get_mut(key.as_str()),
    })
}
