//! File system storage backend
//!
//! Files live directly under a base directory. Paths containing `..` or
//! that resolve outside the base directory are rejected.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores files under a base directory
#[derive(Debug, Clone)]
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

impl FileSystemStorageBackend {
    /// Create a backend rooted at `base_path`
    ///
    /// The directory is created on first write.
    ///
    /// ```rust
    /// use anomalyze_sdk::storage::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new(".anomalyze");
    /// assert!(backend.base_path().ends_with(".anomalyze"));
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(StorageError::PermissionDenied("Empty path".to_string()));
        }
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::PermissionDenied(format!(
                "Path escapes base directory: {}",
                path
            )));
        }

        let full = self.base_path.join(relative);
        if full.exists()
            && let (Ok(canonical), Ok(base)) =
                (full.canonicalize(), self.base_path.canonicalize())
            && !canonical.starts_with(&base)
        {
            return Err(StorageError::PermissionDenied(format!(
                "Path escapes base directory: {}",
                path
            )));
        }
        Ok(full)
    }
}

fn io_error(action: &str, path: &str, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::FileNotFound(path.to_string())
    } else {
        StorageError::IoError(format!("Failed to {} {}: {}", action, path, e))
    }
}

#[async_trait]
impl StorageBackend for FileSystemStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.resolve_path(path)?;
        fs::read(&full_path)
            .await
            .map_err(|e| io_error("read", path, e))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory for", path, e))?;
        }
        fs::write(&full_path, content)
            .await
            .map_err(|e| io_error("write", path, e))?;
        debug!(path = %full_path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve_path(path)?;
        match fs::metadata(&full_path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("check", path, e)),
        }
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", path, e)),
        }
    }

    async fn list_files(&self) -> Result<Vec<String>, StorageError> {
        let mut read_dir = match fs::read_dir(&self.base_path).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list", &self.base_path.display().to_string(), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::IoError(format!("Failed to read directory entry: {}", e)))?
        {
            if let Ok(file_type) = entry.file_type().await
                && file_type.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_creates_base_dir() {
        let dir = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(dir.path().join("session"));

        backend.write_file("user", b"{\"name\":\"Ada\"}").await.unwrap();
        assert!(backend.file_exists("user").await.unwrap());
        assert_eq!(
            backend.read_file("user").await.unwrap(),
            b"{\"name\":\"Ada\"}"
        );
        assert_eq!(backend.list_files().await.unwrap(), vec!["user"]);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(dir.path());

        assert!(!backend.file_exists("nothing").await.unwrap());
        assert!(matches!(
            backend.read_file("nothing").await,
            Err(StorageError::FileNotFound(_))
        ));
        backend.delete_file("nothing").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(dir.path());

        assert!(matches!(
            backend.write_file("../escape", b"x").await,
            Err(StorageError::PermissionDenied(_))
        ));
        assert!(matches!(
            backend.read_file("a/../../b").await,
            Err(StorageError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_list_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(dir.path().join("absent"));
        assert!(backend.list_files().await.unwrap().is_empty());
    }
}
