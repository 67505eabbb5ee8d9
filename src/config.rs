//! Application configuration.
//!
//! Values come from `config.toml` next to the executable's working directory,
//! falling back to defaults for anything missing. `WORD_REVIEW_DB` overrides
//! the database path.

use crate::error::ConfigError;
use crate::models::{BatchSize, SelectionMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_ENV: &str = "WORD_REVIEW_DB";
pub const DEFAULT_DATABASE_PATH: &str = "words.sqlite3";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    pub default_mode: SelectionMode,
    pub default_count: BatchSize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_mode: SelectionMode::AllWords,
            default_count: BatchSize::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path` if it exists. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Loads `config.toml` and applies the environment override.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            config.apply_database_override(&path);
        }
        tracing::info!("Using database {}", config.database.path.display());
        Ok(config)
    }

    fn apply_database_override(&mut self, path: &str) {
        if !path.is_empty() {
            tracing::info!("Database path overridden by {}", DATABASE_ENV);
            self.database.path = PathBuf::from(path);
        }
    }
}
