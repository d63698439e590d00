//! # Core Configuration Module
//!
//! Provides configuration management for the media description core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the injected bridges and the tunables of the engine.
//! It enforces fail-fast validation so a misconfigured host learns about it at
//! startup rather than on the first description write.
//!
//! ## Required Dependencies
//!
//! - `FileSystemAccess` - Required for sidecar and media I/O (desktop default: tokio fs)
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Timestamp source (default: `SystemClock`)
//! - `DescriptionRecognizer` - Recognition backend; without it only manual
//!   edits are possible
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .cache_capacity(512)
//!     .recognizer(Arc::new(MyVisionRecognizer::new()))
//!     .enable_embedded_mirror(true)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, DescriptionRecognizer, FileSystemAccess, SystemClock};
use std::sync::Arc;

/// Default number of sidecar records kept in the read cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default number of concurrent hash computations during reconciliation.
pub const DEFAULT_HASH_CONCURRENCY: usize = 4;

const MAX_CACHE_CAPACITY: usize = 100_000;
const MAX_HASH_CONCURRENCY: usize = 64;

/// Core configuration for the media description core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Capacity (in records) of the sidecar read cache
    pub cache_capacity: usize,

    /// Upper bound on concurrently hashed candidates during reconciliation
    pub hash_concurrency: usize,

    /// File system access abstraction (required)
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Time source for sidecar timestamps
    pub clock: Arc<dyn Clock>,

    /// Recognition backend (optional)
    pub recognizer: Option<Arc<dyn DescriptionRecognizer>>,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("cache_capacity", &self.cache_capacity)
            .field("hash_concurrency", &self.hash_concurrency)
            .field("file_system", &"FileSystemAccess { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "recognizer",
                &self
                    .recognizer
                    .as_ref()
                    .map(|r| format!("DescriptionRecognizer({})", r.model_name())),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Mirror descriptions into PNG/JPEG files after each sidecar write
    pub enable_embedded_mirror: bool,

    /// Run sidecar reconciliation before every directory listing
    pub reconcile_on_list: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_embedded_mirror: true,
            reconcile_on_list: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(Error::Config(format!(
                "Cache capacity exceeds maximum of {} records",
                MAX_CACHE_CAPACITY
            )));
        }

        if self.hash_concurrency == 0 || self.hash_concurrency > MAX_HASH_CONCURRENCY {
            return Err(Error::Config(format!(
                "Hash concurrency must be between 1 and {}",
                MAX_HASH_CONCURRENCY
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for sidecar and media I/O. \
                 Desktop: enable the 'desktop-shims' feature to use the default TokioFileSystem. \
                 Other hosts: inject a FileSystemAccess implementation."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    cache_capacity: Option<usize>,
    hash_concurrency: Option<usize>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    clock: Option<Arc<dyn Clock>>,
    recognizer: Option<Arc<dyn DescriptionRecognizer>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the sidecar read cache capacity (records)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Sets the number of concurrent hash computations during reconciliation
    pub fn hash_concurrency(mut self, concurrency: usize) -> Self {
        self.hash_concurrency = Some(concurrency);
        self
    }

    /// Injects the file system implementation
    pub fn file_system(mut self, file_system: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Injects the clock used for sidecar timestamps
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Injects the recognition backend
    pub fn recognizer(mut self, recognizer: Arc<dyn DescriptionRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Enables or disables the PNG/JPEG embedded mirror
    pub fn enable_embedded_mirror(mut self, enable: bool) -> Self {
        self.features.enable_embedded_mirror = enable;
        self
    }

    /// Enables or disables reconciliation before directory listings
    pub fn reconcile_on_list(mut self, enable: bool) -> Self {
        self.features.reconcile_on_list = enable;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` if no file system was injected and no
    ///   platform default is available
    /// - `Error::Config` if a tunable is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            cache_capacity: self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            hash_concurrency: self.hash_concurrency.unwrap_or(DEFAULT_HASH_CONCURRENCY),
            file_system,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            recognizer: self.recognizer,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
