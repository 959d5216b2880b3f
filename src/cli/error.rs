//! CLI error type

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::ingest::IngestError;
use crate::auth::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("{0}")]
    ExportFailed(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
