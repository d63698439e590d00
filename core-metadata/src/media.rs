//! Media file classification
//!
//! Static extension tables deciding which files can carry a description,
//! which of those can also hold an embedded mirror, and how sidecar paths
//! are derived from media paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix appended to a media file name to form its sidecar name.
pub const SIDECAR_SUFFIX: &str = ".desc.json";

/// Extensions treated as plain text knowledge files.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Extension → (MIME type, category) table for every supported media type.
const MEDIA_TYPES: &[(&str, &str, MediaCategory)] = &[
    // images
    ("png", "image/png", MediaCategory::Image),
    ("jpg", "image/jpeg", MediaCategory::Image),
    ("jpeg", "image/jpeg", MediaCategory::Image),
    ("gif", "image/gif", MediaCategory::Image),
    ("webp", "image/webp", MediaCategory::Image),
    ("bmp", "image/bmp", MediaCategory::Image),
    ("tif", "image/tiff", MediaCategory::Image),
    ("tiff", "image/tiff", MediaCategory::Image),
    ("heic", "image/heic", MediaCategory::Image),
    ("svg", "image/svg+xml", MediaCategory::Image),
    // video
    ("mp4", "video/mp4", MediaCategory::Video),
    ("m4v", "video/x-m4v", MediaCategory::Video),
    ("mov", "video/quicktime", MediaCategory::Video),
    ("avi", "video/x-msvideo", MediaCategory::Video),
    ("mkv", "video/x-matroska", MediaCategory::Video),
    ("webm", "video/webm", MediaCategory::Video),
    ("flv", "video/x-flv", MediaCategory::Video),
    ("wmv", "video/x-ms-wmv", MediaCategory::Video),
    // audio
    ("mp3", "audio/mpeg", MediaCategory::Audio),
    ("wav", "audio/wav", MediaCategory::Audio),
    ("flac", "audio/flac", MediaCategory::Audio),
    ("aac", "audio/aac", MediaCategory::Audio),
    ("m4a", "audio/mp4", MediaCategory::Audio),
    ("ogg", "audio/ogg", MediaCategory::Audio),
    ("opus", "audio/opus", MediaCategory::Audio),
    ("wma", "audio/x-ms-wma", MediaCategory::Audio),
    // documents
    ("pdf", "application/pdf", MediaCategory::Pdf),
];

/// Broad media category of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Unsupported,
}

/// Container formats that can hold an embedded description mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedFormat {
    Png,
    Jpeg,
}

impl EmbeddedFormat {
    /// Pick the codec from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_of(path)?.as_str() {
            "png" => Some(EmbeddedFormat::Png),
            "jpg" | "jpeg" => Some(EmbeddedFormat::Jpeg),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmbeddedFormat::Png => "PNG",
            EmbeddedFormat::Jpeg => "JPEG",
        }
    }
}

/// A media file and its derived attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultimediaFile {
    pub path: PathBuf,
    /// Lowercase extension without the dot, empty if none
    pub extension: String,
    pub mime_type: &'static str,
    pub category: MediaCategory,
}

impl MultimediaFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = extension_of(&path).unwrap_or_default();
        let (mime_type, category) = lookup(&extension)
            .map(|(_, mime, category)| (*mime, *category))
            .unwrap_or(("application/octet-stream", MediaCategory::Unsupported));

        Self {
            path,
            extension,
            mime_type,
            category,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.category != MediaCategory::Unsupported
    }

    pub fn embedded_format(&self) -> Option<EmbeddedFormat> {
        EmbeddedFormat::from_path(&self.path)
    }
}

fn lookup(extension: &str) -> Option<&'static (&'static str, &'static str, MediaCategory)> {
    MEDIA_TYPES.iter().find(|(ext, _, _)| *ext == extension)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// MIME type for an extension (with or without the leading dot)
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    lookup(&extension).map(|(_, mime, _)| *mime)
}

/// Whether a file name has a supported multimedia extension
pub fn is_multimedia_name(name: &str) -> bool {
    extension_of(Path::new(name)).is_some_and(|ext| lookup(&ext).is_some())
}

/// Whether a file name has a text knowledge-file extension
pub fn is_text_name(name: &str) -> bool {
    extension_of(Path::new(name)).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file name is a description sidecar
pub fn is_sidecar_name(name: &str) -> bool {
    name.ends_with(SIDECAR_SUFFIX)
}

/// Whether a file name is hidden (dotfile)
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Sidecar path for a media file: `<path>.desc.json`
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    let mut raw = media_path.as_os_str().to_os_string();
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

/// Media file name a sidecar name refers to, if it is a sidecar name
pub fn media_name_for_sidecar(sidecar_name: &str) -> Option<&str> {
    sidecar_name
        .strip_suffix(SIDECAR_SUFFIX)
        .filter(|name| !name.is_empty())
}
