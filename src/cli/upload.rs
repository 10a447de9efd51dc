//! Upload CLI command

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde_yaml::Value;

use super::app::open_project;
use super::output::Output;
use crate::storage::UploadedFile;

#[derive(Args)]
pub struct UploadArgs {
    /// Local file to store
    pub file: PathBuf,

    /// Folder on the public disk
    #[arg(long, default_value = "uploads")]
    pub dest: String,

    /// Document holding the field the stored path is written to
    #[arg(long, requires = "path")]
    pub doc: Option<String>,

    /// Dotted path of that field
    #[arg(long, requires = "doc")]
    pub path: Option<String>,

    /// Field attribute receiving the stored path
    #[arg(long, default_value = "value")]
    pub attribute: String,
}

pub fn run(args: UploadArgs, output: &Output, config: Option<&Path>) -> Result<()> {
    let project = open_project(config)?;
    let uploads = project.uploads()?;
    let file = UploadedFile::from_path(&args.file)?;

    let (Some(doc), Some(path)) = (&args.doc, &args.path) else {
        let stored = uploads.upload_file(&file, &args.dest, None)?;
        return report(output, &stored, None);
    };

    let store = project.document_store()?;
    let tree = project.field_tree();

    let content = store.get(doc)?;
    let field = tree.get(path, &content)?;

    let stored = uploads.upload_file(&file, &args.dest, Some((field, args.attribute.as_str())))?;

    let updated = tree.set_attribute(path, &args.attribute, Value::from(stored.as_str()), &content)?;
    store.save(doc, &updated)?;

    report(output, &stored, Some(doc))
}

/// Lists the files stored in a folder of the public disk
pub fn list(output: &Output, config: Option<&Path>, dest: &str) -> Result<()> {
    let project = open_project(config)?;
    let files = project.uploads()?.list(dest)?;

    if output.is_json() {
        output.data(&files);
    } else if files.is_empty() {
        println!("No uploads in {}.", dest);
    } else {
        for file in &files {
            output.row(&[file.as_str()]);
        }
    }

    Ok(())
}

fn report(output: &Output, stored: &str, doc: Option<&String>) -> Result<()> {
    if output.is_json() {
        output.data(&serde_json::json!({
            "path": stored,
            "document": doc,
        }));
    } else {
        match doc {
            Some(doc) => output.success(&format!("Stored {} for {}", stored, doc)),
            None => output.success(&format!("Stored {}", stored)),
        }
    }

    Ok(())
}
