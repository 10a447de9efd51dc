//! Main CLI application structure

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_yaml::Value;
use tracing::Level;

use super::output::{Output, OutputFormat};
use super::{doc, field, upload};
use crate::storage::{Project, YamlCodec};

#[derive(Parser)]
#[command(name = "yamlcontent")]
#[command(author, version, about = "YAML document storage with nested field trees")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file to use instead of searching for yamlcontent.toml
    #[arg(long, short = 'c', global = true, env = "YAMLCONTENT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage documents
    #[command(subcommand)]
    Doc(doc::DocCommands),

    /// Show the document index
    Index,

    /// Manage the fields of a document
    #[command(subcommand)]
    Field(field::FieldCommands),

    /// Store a file on the public disk
    Upload(upload::UploadArgs),

    /// List the files stored in a folder of the public disk
    Uploads {
        /// Folder on the public disk
        #[arg(default_value = "uploads")]
        dest: String,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(cli.format);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { path } => {
            tracing::debug!(path = %path, "initializing project");
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized yaml-content project at {}",
                project.root().display()
            ));
        }

        Commands::Doc(cmd) => doc::run(cmd, &output, config)?,
        Commands::Index => doc::index(&output, config)?,
        Commands::Field(cmd) => field::run(cmd, &output, config)?,
        Commands::Upload(args) => upload::run(args, &output, config)?,
        Commands::Uploads { dest } => upload::list(&output, config, &dest)?,
    }

    Ok(())
}

/// Installs the stderr log subscriber
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    // Ignore a second initialization, e.g. when run() is called twice in tests
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Opens the project from `--config`, or the one around the current directory
pub(super) fn open_project(config: Option<&Path>) -> Result<Project> {
    match config {
        Some(path) => Project::open_config_file(path),
        None => Project::open_current(),
    }
}

/// Parses a YAML argument given inline or as `-` for stdin
pub(super) fn yaml_arg(codec: &YamlCodec, arg: &str) -> Result<Value> {
    let text = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read YAML from stdin")?;
        buffer
    } else {
        arg.to_string()
    };

    codec.decode(&text).context("Invalid YAML argument")
}
