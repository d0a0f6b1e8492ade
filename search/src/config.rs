use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted `ingest_batch_size`.
pub const MAX_INGEST_BATCH_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMatching {
    Sensitive,
    Insensitive,
    /// Case-insensitive unless the pattern contains uppercase.
    #[default]
    Smart,
}

/// Engine settings, persisted as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result cap applied when a query sets no limit.
    pub default_limit: usize,
    /// Rows committed per write transaction during bulk ingestion.
    pub ingest_batch_size: usize,
    /// Case handling for keyword suggestions.
    pub case_matching: CaseMatching,
    pub unicode_normalization: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            ingest_batch_size: 1000,
            case_matching: CaseMatching::default(),
            unicode_normalization: true,
        }
    }
}

impl SearchConfig {
    /// Returns the config file path within the given data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("search.toml")
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_limit == 0 {
            errors.push("default_limit must be at least 1".to_string());
        }

        if self.ingest_batch_size == 0 {
            errors.push("ingest_batch_size must be at least 1".to_string());
        }

        if self.ingest_batch_size > MAX_INGEST_BATCH_SIZE {
            errors.push(format!(
                "ingest_batch_size must be at most {MAX_INGEST_BATCH_SIZE}"
            ));
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        Self {
            default_limit: if self.default_limit == 0 {
                defaults.default_limit
            } else {
                self.default_limit
            },
            ingest_batch_size: if self.ingest_batch_size == 0
                || self.ingest_batch_size > MAX_INGEST_BATCH_SIZE
            {
                defaults.ingest_batch_size
            } else {
                self.ingest_batch_size
            },
            ..self.clone()
        }
    }
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
