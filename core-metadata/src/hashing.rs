//! Content hashing
//!
//! Whole-file SHA-256, hex encoded. The same digest is stored in a sidecar's
//! `fileHash` field and recomputed by reconciliation, so both sides must use
//! these helpers.

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Calculate the lowercase hex SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash bytes off the async executor
pub async fn hash_bytes(data: Bytes) -> Result<String> {
    tokio::task::spawn_blocking(move || sha256_hex(&data))
        .await
        .map_err(|e| MetadataError::Io(std::io::Error::other(e)))
}

/// Read a file through the bridge and hash its full contents
pub async fn hash_file(fs: &dyn FileSystemAccess, path: &Path) -> Result<String> {
    let data = fs.read_file(path).await?;
    let size = data.len();
    let hash = hash_bytes(data).await?;
    debug!(path = ?path, size, "Hashed file");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex(b"test data");

        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9"
        );
        assert_ne!(hash, sha256_hex(b"different data"));
    }

    #[tokio::test]
    async fn test_hash_bytes_matches_sync() {
        let data = Bytes::from_static(b"test data");
        assert_eq!(hash_bytes(data.clone()).await.unwrap(), sha256_hex(&data));
    }
}
