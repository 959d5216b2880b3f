//! Aggregate configuration loaded from TOML
//!
//! ```toml
//! [validation]
//! max_file_size = 5242880
//!
//! [ingest]
//! upload_period_ms = 100
//!
//! [export]
//! title = "Line 3 Report"
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::export::ExportConfig;
use crate::export::raster::parse_hex_color;
use crate::ingest::IngestConfig;
use crate::validation::ValidationConfig;

/// Error loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for validation, ingestion and export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyzeConfig {
    pub validation: ValidationConfig,
    pub ingest: IngestConfig,
    pub export: ExportConfig,
}

impl AnomalyzeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest.validate().map_err(ConfigError::Invalid)?;
        if !(self.export.scale.is_finite() && self.export.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "export.scale must be positive, got {}",
                self.export.scale
            )));
        }
        parse_hex_color(&self.export.background).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
