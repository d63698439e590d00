//! Embedded description mirror
//!
//! Format dispatch over the PNG and JPEG codecs, exposing one logical
//! "Description" text field per media file. Reads are tolerant: a missing,
//! unsupported or corrupt file yields `None`.

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{MetadataError, Result};
use crate::jpeg::{self, JpegDescription};
use crate::media::EmbeddedFormat;
use crate::png;
use crate::record::{DescriptionSource, EmbeddedMetadata};

/// Decode the embedded description of an in-memory file
pub fn read_embedded(format: EmbeddedFormat, data: &[u8]) -> Result<Option<EmbeddedMetadata>> {
    let found = match format {
        EmbeddedFormat::Png => {
            png::read_description(data)?.map(|text| (text, DescriptionSource::EmbeddedPng))
        }
        EmbeddedFormat::Jpeg => jpeg::read_description(data)?.map(|found| match found {
            JpegDescription::Comment(text) => (text, DescriptionSource::EmbeddedJpegComment),
            JpegDescription::Exif(text) => (text, DescriptionSource::EmbeddedExif),
        }),
    };

    Ok(found.map(|(text, source)| EmbeddedMetadata::from_text(text, source)))
}

/// Re-encode an in-memory file with `text` as its description
///
/// `Ok(None)` means there was nothing to write.
pub fn write_embedded(format: EmbeddedFormat, data: &[u8], text: &str) -> Result<Option<Vec<u8>>> {
    match format {
        EmbeddedFormat::Png => png::write_description(data, text),
        EmbeddedFormat::Jpeg => jpeg::write_description(data, text),
    }
}

/// File-level mirror over a [`FileSystemAccess`] bridge
#[derive(Clone)]
pub struct EmbeddedMirror {
    fs: Arc<dyn FileSystemAccess>,
}

impl EmbeddedMirror {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    /// Read the mirrored description of `path`, if any
    pub async fn read(&self, path: &Path) -> Option<EmbeddedMetadata> {
        let format = EmbeddedFormat::from_path(path)?;

        let data = match self.fs.read_file(path).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                debug!(path = ?path, "Media file missing, no embedded description");
                return None;
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read media file for embedded description");
                return None;
            }
        };

        match read_embedded(format, &data) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = ?path, error = %e, "Ignoring unreadable embedded metadata");
                None
            }
        }
    }

    /// Mirror `text` into the file at `path`
    ///
    /// Returns the bytes written so callers can re-hash them, or `None` if the
    /// format is not supported or the text is blank.
    pub async fn write(&self, path: &Path, text: &str) -> Result<Option<Bytes>> {
        let Some(format) = EmbeddedFormat::from_path(path) else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mirror_error = |message: String| MetadataError::MirrorWrite {
            path: path.display().to_string(),
            message,
        };

        let original = self
            .fs
            .read_file(path)
            .await
            .map_err(|e| mirror_error(e.to_string()))?;

        let Some(rebuilt) =
            write_embedded(format, &original, text).map_err(|e| mirror_error(e.to_string()))?
        else {
            return Ok(None);
        };

        let rebuilt = Bytes::from(rebuilt);
        self.fs
            .write_file(path, rebuilt.clone())
            .await
            .map_err(|e| mirror_error(e.to_string()))?;

        info!(
            path = ?path,
            format = format.name(),
            size = rebuilt.len(),
            "Mirrored description into media file"
        );
        Ok(Some(rebuilt))
    }
}
