//! wikijson configuration file handling
//!
//! Loads and manages the ~/.config/wikijson/config.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_cache_namespace() -> String {
    "wikijson".to_string()
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".local");
    path.push("share");
    path.push("wikijson");
    path
}

fn default_database() -> PathBuf {
    default_data_dir().join("wikis.db")
}

fn default_cache_directory() -> PathBuf {
    default_data_dir().join("cache")
}

fn default_timestamp_store() -> PathBuf {
    default_data_dir().join("timestamps.db")
}

/// wikijson configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiJsonConfig {
    /// SQLite database holding the `cw_wikis` table
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory the JSON snapshots are written to
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,

    /// SQLite file shared by every process as the invalidation timestamp cache
    #[serde(default = "default_timestamp_store")]
    pub timestamp_store: PathBuf,

    /// Namespace for invalidation timestamp keys
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,
}

impl WikiJsonConfig {
    pub fn new() -> Self {
        Self {
            database: default_database(),
            cache_directory: default_cache_directory(),
            timestamp_store: default_timestamp_store(),
            cache_namespace: default_cache_namespace(),
        }
    }

    /// Load configuration from the default path (~/.config/wikijson/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::WikiJsonError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading wikijson configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            database = %config.database.display(),
            cache_directory = %config.cache_directory.display(),
            namespace = %config.cache_namespace,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving wikijson configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/wikijson/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("wikijson");
        path.push("config.yaml");
        path
    }
}

impl Default for WikiJsonConfig {
    fn default() -> Self {
        Self::new()
    }
}
