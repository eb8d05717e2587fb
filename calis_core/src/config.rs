//! Configuration file support for the tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/calis/config.toml`.

use crate::{Error, ExerciseCategory, QuantificationType, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn workouts_path(&self) -> PathBuf {
        workouts_path(&self.data_dir)
    }

    pub fn records_path(&self) -> PathBuf {
        records_path(&self.data_dir)
    }
}

/// Path of the workout log inside a data directory
pub fn workouts_path(data_dir: &Path) -> PathBuf {
    data_dir.join("workouts.jsonl")
}

/// Path of the personal-record file inside a data directory
pub fn records_path(data_dir: &Path) -> PathBuf {
    data_dir.join("records.json")
}

/// Identity used when no `--user` is given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
        }
    }
}

/// Custom exercise definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomExercise {
    pub id: String,
    pub name: String,
    pub category: ExerciseCategory,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    pub quantification: QuantificationType,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Exercise catalog configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub custom: Vec<CustomExercise>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("calis")
}

fn default_user() -> String {
    "local".into()
}

fn default_difficulty() -> u8 {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("calis").join("config.toml")
    }

    /// Reject settings the rest of the system cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.user.default_user.trim().is_empty() {
            return Err(Error::Config("user.default_user must not be empty".into()));
        }
        for custom in &self.catalog.custom {
            if custom.id.trim().is_empty() {
                return Err(Error::Config("custom exercise with empty id".into()));
            }
            if !(1..=10).contains(&custom.difficulty) {
                return Err(Error::Config(format!(
                    "custom exercise '{}': difficulty {} outside 1..=10",
                    custom.id, custom.difficulty
                )));
            }
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
