//! Field CLI commands

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_yaml::Value;

use super::app::{open_project, yaml_arg};
use super::output::Output;
use crate::domain::CHILDREN_KEY;

#[derive(Subcommand)]
pub enum FieldCommands {
    /// Print the field at a path (e.g. 0.1)
    Get {
        /// Document name
        doc: String,

        /// Dotted field path
        path: String,
    },

    /// Add a field. A `parent` attribute places it under that field.
    Add {
        /// Document name
        doc: String,

        /// Field as YAML, or - for stdin
        field: String,
    },

    /// Change a field. A `parent` attribute moves it.
    Update {
        /// Document name
        doc: String,

        /// Dotted field path
        path: String,

        /// Type the field must currently have
        #[arg(long = "type", short = 't')]
        field_type: String,

        /// Attributes to change as YAML, or - for stdin
        patch: String,
    },

    /// Delete a field and its children
    Delete {
        /// Document name
        doc: String,

        /// Dotted field path
        path: String,

        /// Type the field must currently have
        #[arg(long = "type", short = 't')]
        field_type: String,
    },

    /// Find a field by name among root fields or a parent's children
    Find {
        /// Document name
        doc: String,

        /// Field name
        name: String,

        /// Search the children of this field instead of the root
        #[arg(long)]
        parent: Option<String>,
    },
}

pub fn run(cmd: FieldCommands, output: &Output, config: Option<&Path>) -> Result<()> {
    match cmd {
        FieldCommands::Get { doc, path } => get(output, config, &doc, &path),
        FieldCommands::Add { doc, field } => add(output, config, &doc, &field),
        FieldCommands::Update {
            doc,
            path,
            field_type,
            patch,
        } => update(output, config, &doc, &path, &field_type, &patch),
        FieldCommands::Delete {
            doc,
            path,
            field_type,
        } => delete(output, config, &doc, &path, &field_type),
        FieldCommands::Find { doc, name, parent } => {
            find(output, config, &doc, &name, parent.as_deref())
        }
    }
}

fn get(output: &Output, config: Option<&Path>, doc: &str, path: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;
    let tree = project.field_tree();

    let content = store.get(doc)?;
    let field = tree.get(path, &content)?;

    output.content(store.codec(), field)
}

fn add(output: &Output, config: Option<&Path>, doc: &str, field: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;
    let tree = project.field_tree();

    let field = yaml_arg(store.codec(), field)?;
    let content = store.get(doc)?;

    let updated = tree.save(&field, &content)?;
    store.save(doc, &updated)?;

    let name = field.get("name").and_then(Value::as_str).unwrap_or_default();
    output.success(&format!("Added field {} to {}", name, doc));
    Ok(())
}

fn update(
    output: &Output,
    config: Option<&Path>,
    doc: &str,
    path: &str,
    field_type: &str,
    patch: &str,
) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;
    let tree = project.field_tree();

    let patch = yaml_arg(store.codec(), patch)?;
    let content = store.get(doc)?;
    let existing = tree.get(path, &content)?.clone();

    let updated = tree.update(&existing, &patch, &content, path, field_type)?;
    store.save(doc, &updated)?;

    output.success(&format!("Updated field {} in {}", path, doc));
    Ok(())
}

fn delete(
    output: &Output,
    config: Option<&Path>,
    doc: &str,
    path: &str,
    field_type: &str,
) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;
    let tree = project.field_tree();

    let content = store.get(doc)?;
    let existing = tree.get(path, &content)?.clone();

    let updated = tree.delete(&existing, &content, path, field_type)?;
    store.save(doc, &updated)?;

    output.success(&format!("Deleted field {} from {}", path, doc));
    Ok(())
}

fn find(
    output: &Output,
    config: Option<&Path>,
    doc: &str,
    name: &str,
    parent: Option<&str>,
) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;
    let tree = project.field_tree();

    let content = store.get(doc)?;
    let fields = match parent {
        None => tree.root(&content)?,
        Some(parent) => tree
            .get(parent, &content)?
            .get(CHILDREN_KEY)
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };

    let field = tree
        .find(name, fields)
        .with_context(|| format!("Field not found: {}", name))?;

    output.content(store.codec(), field)
}
