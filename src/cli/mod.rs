//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Doc | Document lifecycle | `doc save`, `doc get`, `doc list`, `index` |
//! | Field | Field tree editing | `field add`, `field update`, `field delete` |
//! | Upload | File storage | `upload photo.jpg --doc contact --path 0 --attribute value` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output, documents as YAML
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr:
//! ```bash
//! yamlcontent --verbose doc get contact
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod doc;
mod field;
mod output;
mod upload;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
