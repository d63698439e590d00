//! Description record types
//!
//! [`DescriptionRecord`] is the authoritative sidecar document.
//! [`EmbeddedMetadata`] is the transient view produced when a PNG/JPEG has
//! no sidecar but carries a mirrored description in its own bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance label written when a record is edited by hand
pub const MANUAL_EDIT_MODEL: &str = "manual-edit";

/// Where a description came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptionSource {
    /// The `.desc.json` sidecar
    SidecarAuthored,
    /// A PNG `tEXt`/`iTXt` chunk
    EmbeddedPng,
    /// A JPEG `COM` marker
    EmbeddedJpegComment,
    /// JPEG EXIF IFD0 `ImageDescription`
    EmbeddedExif,
}

impl DescriptionSource {
    /// Label used when the embedded text carries no `maid` field
    pub fn default_label(&self) -> &'static str {
        match self {
            DescriptionSource::SidecarAuthored => "Sidecar",
            DescriptionSource::EmbeddedPng | DescriptionSource::EmbeddedJpegComment => "Embedded",
            DescriptionSource::EmbeddedExif => "EXIF",
        }
    }

    pub fn is_embedded(&self) -> bool {
        !matches!(self, DescriptionSource::SidecarAuthored)
    }
}

/// Sidecar document stored at `<media>.desc.json`
///
/// Unknown fields written by other tools are kept in `extra` and written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_metadata: Option<Value>,

    /// Legacy single-preset field; read but never written
    #[serde(default, skip_serializing)]
    pub preset_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DescriptionRecord {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = Some(model.into());
        self
    }

    /// Overlay every field `update` sets onto `self`
    pub fn merge_from(&mut self, update: DescriptionRecord) {
        let DescriptionRecord {
            description,
            tags,
            created_at,
            updated_at,
            file_hash,
            model_used,
            original_metadata,
            preset_name,
            extra,
        } = update;

        overlay(&mut self.description, description);
        overlay(&mut self.tags, tags);
        overlay(&mut self.created_at, created_at);
        overlay(&mut self.updated_at, updated_at);
        overlay(&mut self.file_hash, file_hash);
        overlay(&mut self.model_used, model_used);
        overlay(&mut self.original_metadata, original_metadata);
        overlay(&mut self.preset_name, preset_name);

        self.extra.extend(extra);
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Transient view of a description mirrored inside a media file
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedMetadata {
    /// `maid` value of a JSON payload, else the source's default label
    pub preset_name: String,
    pub description: String,
    /// Always empty; tags are never mirrored
    pub tags: String,
    pub original_metadata: Option<Value>,
    pub source: DescriptionSource,
}

impl EmbeddedMetadata {
    /// Wrap raw embedded text, probing it for a JSON `maid` provenance field
    pub fn from_text(text: String, source: DescriptionSource) -> Self {
        let parsed = serde_json::from_str::<Value>(&text)
            .ok()
            .filter(Value::is_object);

        let label = parsed
            .as_ref()
            .and_then(|value| value.get("maid"))
            .map(|maid| match maid {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| source.default_label().to_string());

        Self {
            preset_name: label,
            description: text,
            tags: String::new(),
            original_metadata: parsed,
            source,
        }
    }

    /// Seed a sidecar record from this view
    pub fn into_record(self) -> DescriptionRecord {
        DescriptionRecord {
            description: Some(self.description),
            original_metadata: self.original_metadata,
            ..Default::default()
        }
    }
}

/// Result of a store read
#[derive(Debug, Clone, PartialEq)]
pub enum StoredDescription {
    Sidecar(DescriptionRecord),
    Embedded(EmbeddedMetadata),
}

impl StoredDescription {
    pub fn source(&self) -> DescriptionSource {
        match self {
            StoredDescription::Sidecar(_) => DescriptionSource::SidecarAuthored,
            StoredDescription::Embedded(meta) => meta.source,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            StoredDescription::Sidecar(record) => record.description.as_deref(),
            StoredDescription::Embedded(meta) => Some(meta.description.as_str()),
        }
    }

    pub fn tags(&self) -> Option<&str> {
        match self {
            StoredDescription::Sidecar(record) => record.tags.as_deref(),
            StoredDescription::Embedded(meta) => Some(meta.tags.as_str()),
        }
    }

    /// Base record for a follow-up write
    pub fn into_record(self) -> DescriptionRecord {
        match self {
            StoredDescription::Sidecar(record) => record,
            StoredDescription::Embedded(meta) => meta.into_record(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_serializes_camel_case_without_preset_name() {
        let record = DescriptionRecord {
            description: Some("[@Short:]\ncat".to_string()),
            tags: Some("cat".to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            file_hash: Some("abc".to_string()),
            model_used: Some("vision-1".to_string()),
            preset_name: Some("Short".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["description"], "[@Short:]\ncat");
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["fileHash"], "abc");
        assert_eq!(json["modelUsed"], "vision-1");
        assert!(json.get("presetName").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_record_accepts_legacy_and_unknown_fields() {
        let json = r#"{
            "description": "hello",
            "presetName": "Detailed",
            "rating": 5
        }"#;
        let record: DescriptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.preset_name.as_deref(), Some("Detailed"));
        assert_eq!(record.extra.get("rating"), Some(&Value::from(5)));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["rating"], 5);
        assert!(back.get("presetName").is_none());
    }

    #[test]
    fn test_merge_only_overlays_set_fields() {
        let mut base = DescriptionRecord::new("old")
            .with_tags("a, b")
            .with_model("vision-1");
        base.file_hash = Some("h1".to_string());

        base.merge_from(DescriptionRecord::new("new"));

        assert_eq!(base.description.as_deref(), Some("new"));
        assert_eq!(base.tags.as_deref(), Some("a, b"));
        assert_eq!(base.model_used.as_deref(), Some("vision-1"));
        assert_eq!(base.file_hash.as_deref(), Some("h1"));
    }

    #[test]
    fn test_embedded_label_from_maid() {
        let meta = EmbeddedMetadata::from_text(
            r#"{"maid":"studio-7","prompt":"x"}"#.to_string(),
            DescriptionSource::EmbeddedPng,
        );
        assert_eq!(meta.preset_name, "studio-7");
        assert!(meta.original_metadata.is_some());
        assert_eq!(meta.tags, "");

        let meta = EmbeddedMetadata::from_text("plain".to_string(), DescriptionSource::EmbeddedExif);
        assert_eq!(meta.preset_name, "EXIF");
        assert!(meta.original_metadata.is_none());

        let meta = EmbeddedMetadata::from_text(
            r#"{"other":1}"#.to_string(),
            DescriptionSource::EmbeddedJpegComment,
        );
        assert_eq!(meta.preset_name, "Embedded");
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(DescriptionSource::SidecarAuthored.default_label(), "Sidecar");
        assert!(!DescriptionSource::SidecarAuthored.is_embedded());
        assert!(DescriptionSource::EmbeddedExif.is_embedded());
    }
}
