//! Description service
//!
//! High-level entry point bundling the sidecar store, reconciliation, the
//! directory classifier and the optional recognition backend behind one
//! handle built from a [`CoreConfig`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{DescriptionService, RenderOptions};
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder().recognizer(recognizer).build()?;
//! let service = DescriptionService::new(&config);
//!
//! service.recognize(Path::new("/kb/cat.png"), "Detailed").await?;
//! let prompt = service
//!     .render(Path::new("/kb/cat.png"), &RenderOptions::presets(["Detailed"]))
//!     .await;
//! ```

use bridge_traits::recognition::{DescriptionRecognizer, RecognitionRequest};
use bridge_traits::storage::FileSystemAccess;
use core_runtime::config::{CoreConfig, FeatureFlags};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::classifier::{scan_directory, DirectoryListing};
use crate::error::{MetadataError, Result};
use crate::reconcile::{ReconciliationReport, Reconciler};
use crate::record::{DescriptionRecord, StoredDescription, MANUAL_EDIT_MODEL};
use crate::segments::{self, RenderOptions};
use crate::sidecar::SidecarStore;

/// Merge comma-separated tag lists
///
/// Existing tags keep their order, new ones are appended. Duplicates are
/// dropped case-insensitively, first spelling wins.
pub fn merge_tags(existing: Option<&str>, incoming: &str) -> String {
    let mut merged: Vec<&str> = Vec::new();
    let all = existing.unwrap_or_default().split(',').chain(incoming.split(','));

    for tag in all.map(str::trim).filter(|tag| !tag.is_empty()) {
        let lower = tag.to_lowercase();
        if !merged.iter().any(|seen| seen.to_lowercase() == lower) {
            merged.push(tag);
        }
    }

    merged.join(", ")
}

pub struct DescriptionService {
    fs: Arc<dyn FileSystemAccess>,
    store: SidecarStore,
    reconciler: Reconciler,
    recognizer: Option<Arc<dyn DescriptionRecognizer>>,
    features: FeatureFlags,
}

impl DescriptionService {
    pub fn new(config: &CoreConfig) -> Self {
        let store = SidecarStore::from_config(config);
        let reconciler = Reconciler::new(
            config.file_system.clone(),
            store.clone(),
            config.hash_concurrency,
        );

        Self {
            fs: config.file_system.clone(),
            store,
            reconciler,
            recognizer: config.recognizer.clone(),
            features: config.features,
        }
    }

    pub fn store(&self) -> &SidecarStore {
        &self.store
    }

    /// Sidecar record or embedded fallback for `path`
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn read(&self, path: &Path) -> Option<StoredDescription> {
        self.store.read(path).await
    }

    /// Merge `update` into the sidecar and mirror it
    #[instrument(skip(self, path, update), fields(path = %path.display()))]
    pub async fn write(&self, path: &Path, update: DescriptionRecord) -> Result<DescriptionRecord> {
        self.store.write(path, update).await
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn delete(&self, path: &Path) -> Result<()> {
        self.store.delete(path).await
    }

    /// Describe `path` with the recognition backend and store the result
    /// under segment `preset`
    ///
    /// # Errors
    ///
    /// - `MetadataError::CapabilityMissing` if no recognizer is configured
    /// - `MetadataError::InvalidSegmentName` if `preset` cannot be used as a segment marker
    /// - `MetadataError::Recognition` if the backend fails or returns no text
    /// - `MetadataError::Persistence` if the sidecar cannot be written
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn recognize(&self, path: &Path, preset: &str) -> Result<DescriptionRecord> {
        let recognizer = self.recognizer.as_ref().ok_or_else(|| {
            MetadataError::CapabilityMissing(
                "DescriptionRecognizer is not configured; only manual edits are available"
                    .to_string(),
            )
        })?;
        segments::validate_name(preset)?;

        let result = recognizer
            .recognize(RecognitionRequest::new(path, preset))
            .await
            .map_err(|e| MetadataError::Recognition(e.to_string()))?;

        if result.description.trim().is_empty() {
            return Err(MetadataError::Recognition(format!(
                "recognizer returned no description for preset {preset}"
            )));
        }

        let base = self.store.read(path).await;
        let (description, tags, original_metadata) = match &base {
            Some(StoredDescription::Sidecar(record)) => {
                (record.description.as_deref(), record.tags.as_deref(), None)
            }
            Some(StoredDescription::Embedded(meta)) => (
                Some(meta.description.as_str()),
                None,
                meta.original_metadata.clone(),
            ),
            None => (None, None, None),
        };

        let update = DescriptionRecord {
            description: Some(segments::upsert(description, preset, &result.description)?),
            tags: Some(merge_tags(tags, &result.tags)),
            model_used: Some(result.model.unwrap_or_else(|| recognizer.model_name())),
            original_metadata,
            ..Default::default()
        };

        let record = self.store.write(path, update).await?;
        info!(preset, "Stored recognized description");
        Ok(record)
    }

    /// Replace description and tags by hand
    #[instrument(skip(self, path, description, tags), fields(path = %path.display()))]
    pub async fn edit(
        &self,
        path: &Path,
        description: impl Into<String>,
        tags: impl Into<String>,
    ) -> Result<DescriptionRecord> {
        let update = DescriptionRecord::new(description)
            .with_tags(tags)
            .with_model(MANUAL_EDIT_MODEL);
        self.store.write(path, update).await
    }

    /// Prompt text for `path`, or `None` if nothing is available
    #[instrument(skip(self, path, options), fields(path = %path.display()))]
    pub async fn render(&self, path: &Path, options: &RenderOptions) -> Option<String> {
        let stored = self.store.read(path).await?;
        segments::render(path, stored.description(), stored.tags(), options)
    }

    /// Classify `dir`, reconciling sidecars first when enabled
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn list_directory(&self, dir: &Path) -> Result<DirectoryListing> {
        if self.features.reconcile_on_list {
            if let Err(e) = self.reconciler.reconcile(dir).await {
                warn!(error = %e, "Reconciliation before listing failed");
            }
        }
        scan_directory(self.fs.as_ref(), dir).await
    }

    pub async fn reconcile(&self, dir: &Path) -> Result<ReconciliationReport> {
        self.reconciler.reconcile(dir).await
    }
}
