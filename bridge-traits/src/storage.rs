//! Storage and File System Abstractions
//!
//! Provides the platform-agnostic file I/O trait the description engine runs
//! on. Every sidecar read/write, embedded-mirror rewrite, directory listing
//! and reconciliation rename goes through [`FileSystemAccess`].

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
    pub is_file: bool,
}

/// File system access trait
///
/// Abstracts file I/O operations so the engine can run against the local
/// disk on desktop and against sandboxed storage elsewhere.
///
/// Implementations must report a missing path as an error for which
/// [`BridgeError::is_not_found`](crate::error::BridgeError::is_not_found)
/// returns `true`; the engine relies on that to tell "no sidecar" apart from
/// a real I/O failure.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn copy_bytes(fs: &dyn FileSystemAccess, from: &Path, to: &Path) -> Result<()> {
///     let data = fs.read_file(from).await?;
///     fs.write_file(to, data).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, replacing any previous contents
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Rename (move) a file within the same filesystem
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// List all entries in a directory (non-recursive, unspecified order)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
