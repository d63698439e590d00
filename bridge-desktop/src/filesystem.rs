//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Operates directly on the local disk. Missing paths are reported as
/// `BridgeError::NotFound` carrying the offending path.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError, keeping the path for misses
    fn map_io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BridgeError + '_ {
        move |e| {
            if e.kind() == ErrorKind::NotFound {
                BridgeError::NotFound(path.display().to_string())
            } else {
                BridgeError::Io(e)
            }
        }
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(BridgeError::Io)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error(path))?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
            is_file: metadata.is_file(),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error(path))?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(Self::map_io_error(parent))?;
            }
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error(path))?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .map_err(Self::map_io_error(path))?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(Self::map_io_error(from))?;
        debug!(from = ?from, to = ?to, "Renamed file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error(path))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error(path))?
        {
            entries.push(entry.path());
        }

        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let test_file = dir.path().join("nested").join("test-file.txt");

        let data = Bytes::from("Hello, World!");
        fs.write_file(&test_file, data.clone()).await.unwrap();

        let read_data = fs.read_file(&test_file).await.unwrap();
        assert_eq!(data, read_data);

        let metadata = fs.metadata(&test_file).await.unwrap();
        assert!(metadata.is_file);
        assert!(!metadata.is_directory);
        assert_eq!(metadata.size, 13);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();

        let err = fs.read_file(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(err.is_not_found());

        let err = fs.delete_file(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rename_and_list() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let from = dir.path().join("a.png.desc.json");
        let to = dir.path().join("b.png.desc.json");

        fs.write_file(&from, Bytes::from_static(b"{}")).await.unwrap();
        fs.rename(&from, &to).await.unwrap();

        assert!(!fs.exists(&from).await.unwrap());
        assert!(fs.exists(&to).await.unwrap());

        let entries = fs.list_directory(dir.path()).await.unwrap();
        assert_eq!(entries, vec![to]);
    }
}
