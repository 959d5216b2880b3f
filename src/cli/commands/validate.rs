//! Validate command implementation

use std::path::Path;

use crate::cli::error::CliError;
use crate::cli::output::format_validation;
use crate::models::UploadedFile;
use crate::validation::{FileValidator, ValidationResult};

const PREVIEW_ROWS: usize = 5;

/// Describe `path` as an upload
pub async fn load_upload(path: &Path) -> Result<UploadedFile, CliError> {
    UploadedFile::from_path(path)
        .await
        .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))
}

/// Run the validator and fail when the file is rejected
pub async fn run_validation(
    validator: &FileValidator,
    path: &Path,
) -> Result<ValidationResult, CliError> {
    let file = load_upload(path).await?;
    let result = validator.validate(&file).await;
    if result.valid {
        Ok(result)
    } else {
        Err(CliError::ValidationFailed(result.message))
    }
}

/// Handle the validate command
pub async fn handle_validate(validator: &FileValidator, path: &Path) -> Result<(), CliError> {
    let result = run_validation(validator, path).await?;
    print!("{}", format_validation(&result, PREVIEW_ROWS));
    Ok(())
}
