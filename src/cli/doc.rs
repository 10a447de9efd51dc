//! Document CLI commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use serde_yaml::Value;

use super::app::{open_project, yaml_arg};
use super::output::Output;

#[derive(Subcommand)]
pub enum DocCommands {
    /// Print a document
    Get {
        /// Document name
        name: String,
    },

    /// Write a document, replacing its content
    Save {
        /// Document name
        name: String,

        /// Document content as YAML, or - for stdin
        content: String,
    },

    /// Merge top-level keys into a document
    Update {
        /// Document name
        name: String,

        /// Keys to merge as YAML, or - for stdin
        content: String,
    },

    /// Delete a document and its index entry
    Delete {
        /// Document name
        name: String,
    },

    /// List stored documents
    List,
}

pub fn run(cmd: DocCommands, output: &Output, config: Option<&Path>) -> Result<()> {
    match cmd {
        DocCommands::Get { name } => get(output, config, &name),
        DocCommands::Save { name, content } => save(output, config, &name, &content),
        DocCommands::Update { name, content } => update(output, config, &name, &content),
        DocCommands::Delete { name } => delete(output, config, &name),
        DocCommands::List => list(output, config),
    }
}

fn get(output: &Output, config: Option<&Path>, name: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    let content = store.get(name)?;
    output.content(store.codec(), &content)
}

fn save(output: &Output, config: Option<&Path>, name: &str, content: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    let content = yaml_arg(store.codec(), content)?;
    store.save(name, &content)?;

    output.success(&format!("Saved document {}", name));
    Ok(())
}

fn update(output: &Output, config: Option<&Path>, name: &str, partial: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    let partial = yaml_arg(store.codec(), partial)?;
    store.update(name, &partial)?;

    output.success(&format!("Updated document {}", name));
    Ok(())
}

fn delete(output: &Output, config: Option<&Path>, name: &str) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    store.delete(name)?;

    output.success(&format!("Deleted document {}", name));
    Ok(())
}

fn list(output: &Output, config: Option<&Path>) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    let names = store.list()?;

    if output.is_json() {
        output.data(&names);
    } else if names.is_empty() {
        println!("No documents found.");
    } else {
        for name in &names {
            output.row(&[name.as_str()]);
        }
    }

    Ok(())
}

/// Prints the index as `key -> value` rows
pub fn index(output: &Output, config: Option<&Path>) -> Result<()> {
    let project = open_project(config)?;
    let store = project.document_store()?;

    let index = store.index()?;

    if output.is_json() {
        return output.content(store.codec(), &Value::Mapping(index));
    }

    if index.is_empty() {
        println!("Index is empty.");
        return Ok(());
    }

    println!("{:<38} {}", "KEY", "VALUE");
    println!("{}", "-".repeat(60));
    for (key, value) in &index {
        println!("{:<38} {}", scalar_text(key), scalar_text(value));
    }

    Ok(())
}

/// Plain text of a scalar, falling back to inline YAML
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
