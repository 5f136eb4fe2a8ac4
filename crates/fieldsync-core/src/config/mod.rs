//! Persistent application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

const APP_DIR_NAME: &str = "fieldsync";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "fieldsync.db";

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "FIELDSYNC_DB_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Seconds between background sync wakes
    #[serde(default = "default_background_interval_secs")]
    pub background_interval_secs: u64,
    /// Write the demo task set into an empty store on first launch
    #[serde(default = "default_seed_demo_tasks")]
    pub seed_demo_tasks: bool,
}

const fn default_background_interval_secs() -> u64 {
    15 * 60
}

const fn default_seed_demo_tasks() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            background_interval_secs: default_background_interval_secs(),
            seed_demo_tasks: default_seed_demo_tasks(),
        }
    }
}

/// `<config_dir>/fieldsync/config.json`, or a relative path when the platform
/// has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// `<data_dir>/fieldsync/fieldsync.db`
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

impl AppConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("Failed to read config at {}: {error}", path.display()))
        })?;
        let config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("Failed to parse config at {}: {error}", path.display()))
        })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!(
                    "Failed to create config directory {}: {error}",
                    parent.display()
                ))
            })?;
        }

        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized).map_err(|error| {
            Error::Config(format!("Failed to write config at {}: {error}", path.display()))
        })
    }

    /// Database location: explicit flag, then `FIELDSYNC_DB_PATH`, then the
    /// config file, then the platform data directory.
    pub fn resolve_db_path(&self, explicit: Option<&Path>) -> PathBuf {
        self.resolve_db_path_with_env(explicit, std::env::var(DB_PATH_ENV).ok())
    }

    fn resolve_db_path_with_env(&self, explicit: Option<&Path>, env: Option<String>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = normalize_text_option(env) {
            return PathBuf::from(path);
        }
        self.db_path.clone().unwrap_or_else(default_db_path)
    }

    pub const fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.background_interval_secs == 0 {
            return Err(Error::Config(format!(
                "background_interval_secs must be positive in {}",
                path.display()
            )));
        }
        Ok(())
    }
}
