//! # Storage Layer
//!
//! Persistence for yaml-content documents and uploads.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Documents | YAML | `{disk}/{folder}/{name}.yaml` |
//! | Index | YAML mapping `key: value` | `{disk}/{folder}/{index}.yaml` |
//! | Uploads | Raw bytes | `{public disk}/{destination}/{file}` |
//! | Config | TOML | `yamlcontent.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`FsStore`] writes are atomic (temp file + rename)
//! - [`DocumentStore`] locks the index (`fs2`) around read-modify-write
//! - Document and index writes are not atomic together
//!
//! ## Project Structure
//!
//! ```text
//! project/
//! ├── yamlcontent.toml
//! └── storage/app/              # "local" disk
//!     ├── common/
//!     │   ├── contact.yaml      # Documents
//!     │   └── index.yaml        # uuid -> title
//!     └── public/               # "public" disk
//!         └── uploads/
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point wiring config and disks together
//! - [`DocumentStore`] - Read/write documents and keep the index in sync
//! - [`Uploads`] - Store uploaded files under collision-free names
//! - [`BlobStore`] - Byte storage backends ([`FsStore`], [`MemoryStore`])
//! - [`Config`] - Project and global configuration

mod blob;
mod codec;
mod config;
mod disks;
mod document;
mod fs;
mod memory;
mod project;
mod uploads;

pub use blob::{BlobLock, BlobStore, StoreError, StoreResult};
pub use codec::{CodecError, YamlCodec};
pub use config::{Config, ConfigError, DiskConfig, IndexConfig, YamlConfig, CONFIG_FILE};
pub use disks::Disks;
pub use document::{DocumentError, DocumentStore};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use project::{Project, ProjectError};
pub use uploads::{UploadedFile, Uploads};
