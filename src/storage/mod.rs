//! Storage backend abstraction
//!
//! Session profiles and exported reports are persisted through
//! [`StorageBackend`]:
//! - `MemoryStorageBackend`: in-process map, used by tests and embedders
//! - `FileSystemStorageBackend`: a directory on disk (for the CLI)

use async_trait::async_trait;

pub mod memory;

#[cfg(feature = "native-fs")]
pub mod filesystem;

pub use memory::MemoryStorageBackend;

#[cfg(feature = "native-fs")]
pub use filesystem::FileSystemStorageBackend;

/// Error type for storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Key/value style file store
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a file from storage
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a file, replacing any previous content
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Check if a file exists
    async fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// List stored file names, sorted
    async fn list_files(&self) -> Result<Vec<String>, StorageError>;
}
