//! Description Recognition Capability
//!
//! The engine never produces description text itself. A host injects a
//! [`DescriptionRecognizer`] (typically backed by a vision-capable model API)
//! which, given a file and a preset identity, returns description text and
//! tags or fails. The engine is responsible for merging and persisting the
//! result.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Request for a single recognition pass over one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Absolute path of the media file to describe
    pub path: PathBuf,
    /// Preset identity the result will be stored under
    pub preset_name: String,
}

impl RecognitionRequest {
    pub fn new(path: impl Into<PathBuf>, preset_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            preset_name: preset_name.into(),
        }
    }
}

/// Output of a recognition pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recognition {
    /// Free-form description text
    pub description: String,
    /// Comma-separated tags
    pub tags: String,
    /// Model that produced the text, if the backend reports one
    pub model: Option<String>,
}

/// Recognition collaborator trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::recognition::{DescriptionRecognizer, RecognitionRequest};
///
/// async fn describe(recognizer: &dyn DescriptionRecognizer) -> Result<()> {
///     let request = RecognitionRequest::new("/kb/cat.png", "Detailed");
///     let result = recognizer.recognize(request).await?;
///     println!("{} [{}]", result.description, result.tags);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DescriptionRecognizer: Send + Sync {
    /// Produce description text and tags for the requested file
    async fn recognize(&self, request: RecognitionRequest) -> Result<Recognition>;

    /// Provenance label used when the backend does not report a model
    fn model_name(&self) -> String;
}
