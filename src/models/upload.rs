//! User-supplied files
//!
//! An [`UploadedFile`] lives only for the duration of a validation call.
//! Its content is either already in memory (drag-drop, tests) or read lazily
//! from disk when the validator asks for it.

use std::io;
use std::path::{Path, PathBuf};

/// Where the raw bytes of an upload come from
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Content held in memory
    Bytes(Vec<u8>),
    /// Content read from the local file system on demand
    Path(PathBuf),
}

/// A file picked or dropped by the user
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    size: u64,
    content: FileContent,
}

impl UploadedFile {
    /// Create an upload from in-memory bytes
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: FileContent::Bytes(bytes),
        }
    }

    /// Create an upload backed by a file on disk
    ///
    /// Only metadata is read here; content is read during validation.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            size: metadata.len(),
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    /// Override the declared size (a browser reports size separately from content)
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lower-cased text after the last `.` of the name (the whole name when there is none)
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Read the raw content
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            FileContent::Bytes(bytes) => Ok(bytes.clone()),
            FileContent::Path(path) => tokio::fs::read(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased_last_segment() {
        let file = UploadedFile::from_bytes("Sensors.Export.XLSX", vec![]);
        assert_eq!(file.extension(), "xlsx");

        let file = UploadedFile::from_bytes("README", vec![]);
        assert_eq!(file.extension(), "readme");
    }

    #[test]
    fn test_size_tracks_bytes_unless_overridden() {
        let file = UploadedFile::from_bytes("a.csv", vec![0; 12]);
        assert_eq!(file.size(), 12);
        assert_eq!(file.with_size(99).size(), 99);
    }

    #[tokio::test]
    async fn test_from_path_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.csv");
        std::fs::write(&path, b"timestamp,sensor_id,value\n").unwrap();

        let file = UploadedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "sensors.csv");
        assert_eq!(file.size(), 26);
        assert_eq!(file.read().await.unwrap(), b"timestamp,sensor_id,value\n");
    }
}
