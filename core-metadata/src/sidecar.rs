//! Sidecar description store
//!
//! CRUD over `<media>.desc.json`. The sidecar is the authoritative record;
//! after each successful sidecar write the description is mirrored into the
//! media file itself (PNG/JPEG only) on a best-effort basis.
//!
//! ## Read path
//!
//! ```text
//! read(path)
//!   ├─ LRU cache hit            → Sidecar(record)
//!   ├─ sidecar JSON             → Sidecar(record)   (cached)
//!   ├─ sidecar missing, PNG/JPEG → Embedded(meta)   (never cached)
//!   └─ anything else            → None
//! ```

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::embedded::EmbeddedMirror;
use crate::error::{MetadataError, Result};
use crate::hashing::{hash_bytes, hash_file};
use crate::media::{sidecar_path, EmbeddedFormat};
use crate::record::{DescriptionRecord, StoredDescription};

/// Store for description sidecars with an embedded-mirror fallback
#[derive(Clone)]
pub struct SidecarStore {
    /// File system bridge
    fs: Arc<dyn FileSystemAccess>,
    /// Timestamp source for `createdAt` / `updatedAt`
    clock: Arc<dyn Clock>,
    mirror: EmbeddedMirror,
    /// Mirror descriptions into PNG/JPEG after writes
    mirror_enabled: bool,
    /// Parsed sidecars keyed by media path
    cache: Arc<RwLock<LruCache<PathBuf, DescriptionRecord>>>,
}

impl SidecarStore {
    /// Create a new SidecarStore
    ///
    /// # Arguments
    ///
    /// * `fs` - File system bridge used for sidecar and media I/O
    /// * `clock` - Timestamp source
    /// * `cache_capacity` - Number of sidecar records kept in memory
    /// * `mirror_enabled` - Whether writes are mirrored into PNG/JPEG files
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
        cache_capacity: usize,
        mirror_enabled: bool,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            mirror: EmbeddedMirror::new(fs.clone()),
            fs,
            clock,
            mirror_enabled,
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.file_system.clone(),
            config.clock.clone(),
            config.cache_capacity,
            config.features.enable_embedded_mirror,
        )
    }

    /// Read the description of a media file
    ///
    /// Never fails: I/O and parse problems are logged and reported as no
    /// description.
    pub async fn read(&self, path: &Path) -> Option<StoredDescription> {
        match self.read_sidecar(path).await {
            Ok(Some(record)) => Some(StoredDescription::Sidecar(record)),
            Ok(None) => {
                EmbeddedFormat::from_path(path)?;
                self.mirror
                    .read(path)
                    .await
                    .map(StoredDescription::Embedded)
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read description sidecar");
                None
            }
        }
    }

    /// Read only the sidecar of a media file
    ///
    /// Returns `Ok(None)` when no sidecar exists.
    pub async fn read_sidecar(&self, path: &Path) -> Result<Option<DescriptionRecord>> {
        {
            let mut cache = self.cache.write().await;
            if let Some(record) = cache.get(path) {
                debug!(path = ?path, "Sidecar cache hit");
                return Ok(Some(record.clone()));
            }
        }

        let Some(record) = self.load_sidecar_file(&sidecar_path(path)).await? else {
            return Ok(None);
        };

        let mut cache = self.cache.write().await;
        cache.put(path.to_path_buf(), record.clone());
        Ok(Some(record))
    }

    /// Parse a sidecar file directly, bypassing the cache
    pub async fn load_sidecar_file(&self, sidecar: &Path) -> Result<Option<DescriptionRecord>> {
        let data = match self.fs.read_file(sidecar).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_slice(&data)?;
        Ok(Some(record))
    }

    /// Merge `update` into the sidecar of `path` and persist it
    ///
    /// Only a failure to load or persist the sidecar is returned as an error.
    /// An existing sidecar that is not valid JSON is overwritten. Hashing and
    /// mirroring problems are logged.
    ///
    /// # Returns
    ///
    /// The record as stored on disk
    pub async fn write(&self, path: &Path, update: DescriptionRecord) -> Result<DescriptionRecord> {
        let existing = match self.read_sidecar(path).await {
            Ok(existing) => existing,
            Err(MetadataError::Serialization(e)) => {
                warn!(path = ?path, error = %e, "Existing sidecar is not valid JSON, overwriting");
                None
            }
            Err(e) => {
                return Err(MetadataError::Persistence {
                    path: sidecar_path(path).display().to_string(),
                    message: format!("existing sidecar unreadable: {e}"),
                })
            }
        };

        let mut record = existing.unwrap_or_default();
        record.merge_from(update);
        record.preset_name = None;

        let now = self.clock.now();
        record.updated_at = Some(now);
        if record.created_at.is_none() {
            record.created_at = Some(now);
        }

        match hash_file(self.fs.as_ref(), path).await {
            Ok(hash) => record.file_hash = Some(hash),
            Err(e) => debug!(path = ?path, error = %e, "Media file not hashable, keeping previous hash"),
        }

        self.persist(path, &record).await?;
        info!(path = ?path, "Saved description sidecar");

        if self.mirror_enabled {
            self.mirror_into_media(path, &mut record).await;
        }

        Ok(record)
    }

    async fn mirror_into_media(&self, path: &Path, record: &mut DescriptionRecord) {
        let Some(text) = record.description.as_deref() else {
            return;
        };

        let written = match self.mirror.write(path, text).await {
            Ok(Some(written)) => written,
            Ok(None) => return,
            Err(e) => {
                warn!(path = ?path, error = %e, "Embedded mirror write failed, sidecar kept");
                return;
            }
        };

        let hash = match hash_bytes(written).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to hash mirrored file");
                return;
            }
        };

        if record.file_hash.as_deref() == Some(hash.as_str()) {
            return;
        }
        record.file_hash = Some(hash);
        if let Err(e) = self.persist(path, record).await {
            warn!(path = ?path, error = %e, "Failed to refresh file hash after mirroring");
        }
    }

    async fn persist(&self, path: &Path, record: &DescriptionRecord) -> Result<()> {
        let sidecar = sidecar_path(path);
        let json = serde_json::to_vec_pretty(record)?;

        self.fs
            .write_file(&sidecar, Bytes::from(json))
            .await
            .map_err(|e| MetadataError::Persistence {
                path: sidecar.display().to_string(),
                message: e.to_string(),
            })?;

        self.invalidate(path).await;
        Ok(())
    }

    /// Remove the sidecar of `path`; a missing sidecar is not an error
    pub async fn delete(&self, path: &Path) -> Result<()> {
        self.invalidate(path).await;

        match self.fs.delete_file(&sidecar_path(path)).await {
            Ok(()) => {
                info!(path = ?path, "Deleted description sidecar");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop any cached record for `path`
    pub async fn invalidate(&self, path: &Path) {
        self.cache.write().await.pop(path);
    }

    /// Number of cached records
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }
}
