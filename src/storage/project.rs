//! Project management
//!
//! A project is a directory holding `yamlcontent.toml`. It wires the
//! configured disks into the document store, the field tree engine and the
//! upload store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use super::config::{Config, DiskConfig, CONFIG_FILE};
use super::{Disks, DocumentStore, Uploads};
use crate::domain::FieldTree;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("No yamlcontent.toml found. Run 'yamlcontent init' first.")]
    NotInProject,

    #[error("Config file not found: {0}")]
    MissingConfig(PathBuf),
}

/// A yaml-content project
pub struct Project {
    root: PathBuf,
    config: Config,
    disks: Disks,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);

        if !config_path.is_file() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::load_from(&config_path)?;
        Ok(Self::from_config(root, config))
    }

    /// Opens the project described by an explicit config file. Relative
    /// disk roots resolve against the file's directory.
    pub fn open_config_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ProjectError::MissingConfig(path.to_path_buf()).into());
        }

        let config = Config::load_from(path)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self::from_config(root, config))
    }

    /// Opens the project at the current directory or a parent, falling back
    /// to the global config file
    pub fn open_current() -> Result<Self> {
        if let Some(root) = Config::find_project_root() {
            return Self::open(root);
        }

        match Config::global_config_file() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "using global config");
                Self::open_config_file(&path)
            }
            _ => Err(ProjectError::NotInProject.into()),
        }
    }

    /// Builds a project from an already loaded configuration
    pub fn from_config(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let disks = Disks::from_config(&config, &root);

        Self {
            root,
            config,
            disks,
        }
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create project directory: {}", root.display()))?;

        // Create default config
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, Config::default_file_contents())
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let project = Self::open(root)?;

        // Create local disk roots
        for disk in project.config.disks.values() {
            if let DiskConfig::Local { root: disk_root } = disk {
                let dir = project.root.join(disk_root);
                fs::create_dir_all(&dir).with_context(|| {
                    format!("Failed to create disk directory: {}", dir.display())
                })?;
            }
        }

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the disk registry
    pub fn disks(&self) -> &Disks {
        &self.disks
    }

    /// Returns a mutable reference to the disk registry
    pub fn disks_mut(&mut self) -> &mut Disks {
        &mut self.disks
    }

    /// Returns the document store
    pub fn document_store(&self) -> Result<DocumentStore> {
        let disk = self.disks.get(&self.config.storage)?;

        Ok(DocumentStore::new(
            disk,
            self.config.folder.clone(),
            self.config.codec(),
            self.config.index.clone(),
        ))
    }

    /// Returns the field tree engine
    pub fn field_tree(&self) -> FieldTree {
        FieldTree::new(self.config.fields_key.clone())
    }

    /// Returns the upload store on the public disk
    pub fn uploads(&self) -> Result<Uploads> {
        let disk = self.disks.get(&self.config.public_disk)?;
        Ok(Uploads::new(disk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::storage::memory::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.root().join(CONFIG_FILE).is_file());
        assert!(project.root().join("storage/app").is_dir());
        assert!(project.root().join("storage/app/public").is_dir());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "folder = \"kept\"\n").unwrap();
        let project = Project::init(dir.path()).unwrap(); // Should not fail

        assert_eq!(project.config().folder, "kept");
    }

    #[test]
    fn open_existing_project() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let result = Project::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn open_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "folder = \"pages\"\n").unwrap();

        let project = Project::open_config_file(&path).unwrap();
        assert_eq!(project.root(), dir.path());
        assert_eq!(project.config().folder, "pages");

        assert!(Project::open_config_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn stores_use_configured_disks() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let store = project.document_store().unwrap();
        let content = serde_yaml::from_str("uuid: 1\ntitle: Test\nform: []\n").unwrap();
        store.save("test", &content).unwrap();

        assert!(dir.path().join("storage/app/common/test.yaml").is_file());
        assert!(dir.path().join("storage/app/common/index.yaml").is_file());
        assert_eq!(project.field_tree().fields_key(), "form");
    }

    #[test]
    fn uploads_go_to_public_disk() {
        let dir = TempDir::new().unwrap();
        let mut project = Project::init(dir.path()).unwrap();

        let public = Arc::new(MemoryStore::new());
        project.disks_mut().insert("public", public.clone());

        let file = crate::storage::UploadedFile::new("a.png", b"png".to_vec());
        let stored = project.uploads().unwrap().upload_file(&file, "img", None).unwrap();

        assert_eq!(stored, "img/a.png");
        assert_eq!(public.paths(), vec!["img/a.png"]);
    }
}
