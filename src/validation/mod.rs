//! Validation functionality
//!
//! Provides validation logic for:
//! - Uploaded sensor files (extension, size, parse, required columns)

pub mod file;

pub use file::{
    FileValidator, MAX_FILE_SIZE, REQUIRED_COLUMNS, ValidationConfig, ValidationError,
    ValidationResult,
};
