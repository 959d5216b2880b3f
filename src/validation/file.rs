//! Uploaded file validation
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. extension is one of `csv`, `xlsx`, `xls`
//! 2. declared size is at most [`MAX_FILE_SIZE`]
//! 3. content can be read (bounded by a timeout) and parsed
//! 4. at least one data row exists
//! 5. every required column is present, matched case-insensitively by substring
//!
//! [`FileValidator::check`] returns the typed error; [`FileValidator::validate`]
//! folds the outcome into the `valid` / `message` / `data` shape the dashboard consumes.

use crate::import::{TabularFormat, TabularImporter};
use crate::models::{Record, UploadedFile};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upload size limit (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Columns every sensor sheet must carry
pub const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "sensor_id", "value"];

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Column name fragments that must appear in the header row
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,

    /// Bound on reading the file content, 0 disables the bound
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

fn default_required_columns() -> Vec<String> {
    REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            required_columns: default_required_columns(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Reasons an upload is rejected
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please upload a CSV or Excel file (xlsx/xls)")]
    InvalidExtension(String),

    #[error("File size exceeds {}MB limit", .limit / BYTES_PER_MB)]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Error reading file: {0}")]
    ParseFailure(String),

    #[error("Error reading file: read timed out after {timeout_ms}ms")]
    ReadTimeout { timeout_ms: u64 },

    #[error("The file appears to be empty")]
    EmptyFile,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Outcome handed to the dashboard
///
/// `valid == false` implies `data` is `None`; `valid == true` implies `data`
/// holds at least one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
}

impl ValidationResult {
    /// A passing result; an empty record list fails as an empty file
    pub fn success(records: Vec<Record>) -> Self {
        if records.is_empty() {
            return Self::failure(&ValidationError::EmptyFile);
        }
        Self {
            valid: true,
            message: format!("Successfully loaded {} records", records.len()),
            data: Some(records),
        }
    }

    pub fn failure(error: &ValidationError) -> Self {
        Self {
            valid: false,
            message: error.to_string(),
            data: None,
        }
    }

    /// Number of parsed records (0 when invalid)
    pub fn record_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Take the parsed records, if valid and non-empty
    pub fn into_data(self) -> Option<Vec<Record>> {
        match self.data {
            Some(records) if self.valid && !records.is_empty() => Some(records),
            _ => None,
        }
    }
}

impl From<Result<Vec<Record>, ValidationError>> for ValidationResult {
    fn from(outcome: Result<Vec<Record>, ValidationError>) -> Self {
        match outcome {
            Ok(records) => Self::success(records),
            Err(err) => Self::failure(&err),
        }
    }
}

/// Validator for uploaded sensor files
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    config: ValidationConfig,
    importer: TabularImporter,
}

impl FileValidator {
    /// Create a validator with default limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            config,
            importer: TabularImporter::new(),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a file and return the user-facing result
    pub async fn validate(&self, file: &UploadedFile) -> ValidationResult {
        let outcome = self.check(file).await;
        match &outcome {
            Ok(records) => info!(file = %file.name(), records = records.len(), "File validated"),
            Err(err) => warn!(file = %file.name(), error = %err, "File rejected"),
        }
        outcome.into()
    }

    /// Validate a file and return the parsed records or the first failed check
    pub async fn check(&self, file: &UploadedFile) -> Result<Vec<Record>, ValidationError> {
        let extension = file.extension();
        if TabularFormat::from_extension(&extension).is_none() {
            return Err(ValidationError::InvalidExtension(extension));
        }

        if file.size() > self.config.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                limit: self.config.max_file_size,
            });
        }

        let bytes = self.read_bounded(file.read()).await?;
        debug!(file = %file.name(), bytes = bytes.len(), "File content read");

        let imported = self
            .importer
            .import(&extension, &bytes)
            .map_err(|e| ValidationError::ParseFailure(e.to_string()))?;

        if imported.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        let missing = self.missing_columns(&imported.headers);
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing));
        }

        Ok(imported.records)
    }

    /// Required columns not matched by any header, in configured order
    pub fn missing_columns(&self, headers: &[String]) -> Vec<String> {
        let headers: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        self.config
            .required_columns
            .iter()
            .filter(|required| {
                let needle = required.to_lowercase();
                !headers.iter().any(|h| h.contains(&needle))
            })
            .cloned()
            .collect()
    }

    async fn read_bounded<F>(&self, read: F) -> Result<Vec<u8>, ValidationError>
    where
        F: Future<Output = io::Result<Vec<u8>>>,
    {
        let result = if self.config.read_timeout_ms == 0 {
            read.await
        } else {
            let limit = Duration::from_millis(self.config.read_timeout_ms);
            match tokio::time::timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ValidationError::ReadTimeout {
                        timeout_ms: self.config.read_timeout_ms,
                    });
                }
            }
        };
        result.map_err(|e| ValidationError::ParseFailure(e.to_string()))
    }
}
