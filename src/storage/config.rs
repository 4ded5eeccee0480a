//! Store configuration.
//!
//! Each executable builds one [`StoreConfig`] and hands it to the store; there
//! is no process-wide configuration object.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory by [`StoreConfig::load`].
pub const CONFIG_FILE_NAME: &str = "racelog.toml";

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "runner.db";

/// Names of the two record tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    /// Race records table
    pub races: String,
    /// GPS sample table
    pub gps_points: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            races: "races".to_string(),
            gps_points: "gps_points".to_string(),
        }
    }
}

impl TableNames {
    /// Check that both names are plain SQL identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.races, &self.gps_points] {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidTableName(name.clone()));
            }
        }

        if self.races == self.gps_points {
            return Err(ConfigError::InvalidTableName(format!(
                "{} (used for both tables)",
                self.races
            )));
        }

        Ok(())
    }
}

/// Where the store lives and how its tables are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Table names
    pub tables: TableNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            tables: TableNames::default(),
        }
    }
}

impl StoreConfig {
    /// Configuration pointing at a specific database file with default tables.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Default::default()
        }
    }

    /// Load `racelog.toml` from the working directory, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: StoreConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.tables.validate()?;

        Ok(config)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}
