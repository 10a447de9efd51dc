//! Named blob stores

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::blob::BlobStore;
use super::config::{Config, ConfigError, DiskConfig};
use super::fs::FsStore;
use super::memory::MemoryStore;

/// Registry handing out blob stores by disk name
#[derive(Default, Clone)]
pub struct Disks {
    disks: BTreeMap<String, Arc<dyn BlobStore>>,
}

impl Disks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every disk declared in `config`. Relative local roots are
    /// resolved against `base`.
    pub fn from_config(config: &Config, base: &Path) -> Self {
        let mut disks = Self::new();

        for (name, disk) in &config.disks {
            let store: Arc<dyn BlobStore> = match disk {
                DiskConfig::Local { root } => {
                    let root = base.join(root);
                    debug!(disk = %name, root = %root.display(), "local disk");
                    Arc::new(FsStore::new(root))
                }
                DiskConfig::Memory => {
                    debug!(disk = %name, "memory disk");
                    Arc::new(MemoryStore::new())
                }
            };
            disks.insert(name.clone(), store);
        }

        disks
    }

    /// Registers or replaces a disk
    pub fn insert(&mut self, name: impl Into<String>, store: Arc<dyn BlobStore>) {
        self.disks.insert(name.into(), store);
    }

    /// Returns the disk called `name`
    pub fn get(&self, name: &str) -> Result<Arc<dyn BlobStore>, ConfigError> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDisk(name.to_string()))
    }

    /// Names of all registered disks
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }
}
