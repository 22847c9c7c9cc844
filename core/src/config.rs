use crate::error::Result;
use crate::record::RecordFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project-level config file
pub const CONFIG_FILE_NAME: &str = "dsversion.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub commit: CommitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per dataset
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Serialization used for new record files
    #[serde(default)]
    pub record_format: RecordFormat,
    /// Show a progress bar while copying objects
    #[serde(default)]
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    #[serde(default = "default_index_dimension")]
    pub index_dimension: String,
    #[serde(default = "default_uri_dimension")]
    pub uri_dimension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitConfig {
    /// Hold an exclusive lock file while committing
    #[serde(default = "default_true")]
    pub lock: bool,
    /// fsync files before they are renamed into place
    #[serde(default)]
    pub sync: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".dsversion")
}

fn default_index_dimension() -> String {
    "id".to_string()
}

fn default_uri_dimension() -> String {
    "uri".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            record_format: RecordFormat::default(),
            show_progress: false,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            index_dimension: default_index_dimension(),
            uri_dimension: default_uri_dimension(),
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            lock: true,
            sync: false,
        }
    }
}

impl Config {
    /// Load a config file. A relative storage root is resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.storage.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.storage.root = dir.join(&config.storage.root);
            }
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve configuration for a project directory.
    ///
    /// Priority order (highest to lowest):
    /// 1. `<dir>/dsversion.toml`
    /// 2. Global config file (`~/.dsversion/global.toml`)
    /// 3. Defaults, with the storage root placed under `dir`
    pub fn discover(dir: &Path) -> Result<Self> {
        let local_config_path = dir.join(CONFIG_FILE_NAME);
        if local_config_path.exists() {
            return Self::load(&local_config_path);
        }

        if let Some(global_config_path) = global_config_path() {
            if global_config_path.exists() {
                return Self::load(&global_config_path);
            }
        }

        let mut config = Config::default();
        config.storage.root = dir.join(&config.storage.root);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let config_toml = toml::to_string_pretty(self)?;
        fs::write(path, config_toml)?;
        Ok(())
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dsversion").join("global.toml"))
}
