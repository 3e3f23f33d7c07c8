//! User configuration, read from `<config_dir>/tasktide/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DATA_DIR_ENV: &str = "TASKTIDE_DATA_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where task data and the log file live.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Used when no preference has been saved yet. Unset: ask the terminal.
    #[serde(default)]
    pub dark: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Data directory: env override, then config, then the platform default.
    pub fn data_dir(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.storage.data_dir.clone())
            .unwrap_or_else(default_data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tasktide"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tasktide").join("config.toml"))
}

/// Loads the config at `path`. A missing file gives the defaults; an
/// unreadable or invalid one is an error the caller reports once logging is up.
pub fn load_config_from(path: &Path) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}
