use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::groups::DEFAULT_MEMBER_DELIMITER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("member_delimiter must not be empty")]
    EmptyDelimiter,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Separator between race ids in a group summary's member list.
    pub member_delimiter: String,
    pub tables: TableNames,
    pub files: CsvFiles,
}

/// Table names in a SQLite snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub races: String,
    pub summary: String,
    pub years: String,
}

/// File names inside a CSV snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvFiles {
    pub races: String,
    pub summary: String,
    pub years: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            member_delimiter: DEFAULT_MEMBER_DELIMITER.to_string(),
            tables: TableNames::default(),
            files: CsvFiles::default(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            races: "races".to_string(),
            summary: "race_summary".to_string(),
            years: "race_years".to_string(),
        }
    }
}

impl Default for CsvFiles {
    fn default() -> Self {
        Self {
            races: "races.csv".to_string(),
            summary: "race_summary.csv".to_string(),
            years: "race_years.csv".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.member_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        Ok(())
    }
}
