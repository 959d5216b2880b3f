//! In-memory storage backend

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Stores files in a map keyed by path
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_files<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> T,
    ) -> Result<T, StorageError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| StorageError::IoError("memory store lock poisoned".to_string()))?;
        Ok(f(&mut files))
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.with_files(|files| files.get(path).cloned())?
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        self.with_files(|files| {
            files.insert(path.to_string(), content.to_vec());
        })
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.with_files(|files| files.contains_key(path))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        self.with_files(|files| {
            files.remove(path);
        })
    }

    async fn list_files(&self) -> Result<Vec<String>, StorageError> {
        self.with_files(|files| files.keys().cloned().collect())
    }
}
