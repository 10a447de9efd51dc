//! Configuration handling for yaml-content
//!
//! Configuration is stored in `yamlcontent.toml` at the project root, or in
//! the global config directory (`~/.config/yamlcontent/yamlcontent.toml` on
//! Linux) when no project file is found.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{YamlCodec, DEFAULT_INDENT, DEFAULT_INLINE};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "yamlcontent.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Unknown disk: {0}")]
    UnknownDisk(String),
}

/// YAML output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct YamlConfig {
    /// Nesting level from which collections are written in flow style
    pub inline: usize,

    /// Spaces per indentation level
    pub indent: usize,
}

impl Default for YamlConfig {
    fn default() -> Self {
        Self {
            inline: DEFAULT_INLINE,
            indent: DEFAULT_INDENT,
        }
    }
}

/// Which document fields the index maps from and to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    /// Index document name, without extension
    #[serde(alias = "fileName")]
    pub file_name: String,

    /// Document field used as index key
    pub key: String,

    /// Document field used as index value
    pub value: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            file_name: "index".to_string(),
            key: "uuid".to_string(),
            value: "title".to_string(),
        }
    }
}

/// Backend of a named disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum DiskConfig {
    /// Directory on the local filesystem
    Local { root: PathBuf },

    /// Process memory, gone on exit
    Memory,
}

fn default_disks() -> BTreeMap<String, DiskConfig> {
    BTreeMap::from([
        (
            "local".to_string(),
            DiskConfig::Local {
                root: PathBuf::from("storage/app"),
            },
        ),
        (
            "public".to_string(),
            DiskConfig::Local {
                root: PathBuf::from("storage/app/public"),
            },
        ),
    ])
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Disk documents are stored on
    pub storage: String,

    /// Folder on that disk holding documents and the index
    pub folder: String,

    /// Document key holding the root field sequence
    pub fields_key: String,

    /// Disk uploads are stored on
    pub public_disk: String,

    pub yaml: YamlConfig,

    pub index: IndexConfig,

    pub disks: BTreeMap<String, DiskConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: "local".to_string(),
            folder: "common".to_string(),
            fields_key: "form".to_string(),
            public_disk: "public".to_string(),
            yaml: YamlConfig::default(),
            index: IndexConfig::default(),
            disks: default_disks(),
        }
    }
}

impl Config {
    /// Parses and validates configuration text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Loads the global configuration, or defaults if there is none
    pub fn load_global() -> Result<Self> {
        match Self::global_config_file() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Checks the settings that would otherwise fail deep inside a store
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.yaml.indent < 1 {
            return Err(ConfigError::Invalid("yaml.indent must be at least 1".to_string()));
        }

        let required = [
            ("index.file_name", &self.index.file_name),
            ("index.key", &self.index.key),
            ("index.value", &self.index.value),
            ("fields_key", &self.fields_key),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
        }

        for (setting, disk) in [("storage", &self.storage), ("public_disk", &self.public_disk)] {
            if !self.disks.contains_key(disk) {
                return Err(ConfigError::Invalid(format!(
                    "{} refers to undeclared disk '{}'",
                    setting, disk
                )));
            }
        }

        Ok(())
    }

    /// Returns the codec for the configured YAML settings
    pub fn codec(&self) -> YamlCodec {
        YamlCodec::new(self.yaml.inline, self.yaml.indent)
    }

    /// Returns the settings of a named disk
    pub fn disk(&self, name: &str) -> Result<&DiskConfig, ConfigError> {
        self.disks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDisk(name.to_string()))
    }

    /// Writes the configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "yamlcontent", "yamlcontent")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the global config file path
    pub fn global_config_file() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Finds the project root by walking up from the current directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Finds the nearest directory at or above `start` holding a config file
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(CONFIG_FILE).is_file())
            .map(Path::to_path_buf)
    }

    /// Commented default configuration written by `init`
    pub fn default_file_contents() -> &'static str {
        r#"# yaml-content configuration

# Disk documents and the index are stored on
storage = "local"

# Folder on that disk
folder = "common"

# Document key holding the field tree
fields_key = "form"

# Disk uploaded files are stored on
public_disk = "public"

[yaml]
# Nesting level from which collections are written inline
inline = 15
indent = 2

[index]
file_name = "index"
key = "uuid"
value = "title"

# Relative roots resolve against this file's directory
[disks.local]
driver = "local"
root = "storage/app"

[disks.public]
driver = "local"
root = "storage/app/public"
"#
    }
}
