//! Segmented description text
//!
//! A description holds several named blocks, one per recognition preset:
//!
//! ```text
//! [@Detailed:]
//! A tabby cat asleep on a green sofa.
//!
//! [@Short:]
//! cat, sofa
//! ```
//!
//! Text before the first marker is not part of any segment. A description
//! with no marker at all reads as a single implicit `Native` segment, which
//! is never written back.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{MetadataError, Result};

/// Name of the implicit segment for unmarked text
pub const NATIVE_SEGMENT: &str = "Native";

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[@([^\]]+):\]").expect("segment marker pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub content: String,
}

impl Segment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Parse marked segments in order
///
/// A repeated name replaces the earlier content but keeps the earlier
/// position, so names stay unique.
pub fn parse(description: &str) -> Vec<Segment> {
    let markers: Vec<_> = MARKER.captures_iter(description).collect();
    let mut segments: Vec<Segment> = Vec::with_capacity(markers.len());

    for (index, captures) in markers.iter().enumerate() {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let end = markers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(description.len());
        let content = description[whole.end()..end].trim().to_string();
        let name = name.as_str();

        match segments.iter_mut().find(|segment| segment.name == name) {
            Some(existing) => existing.content = content,
            None => segments.push(Segment::new(name, content)),
        }
    }

    segments
}

/// Parse for display: unmarked non-empty text becomes one `Native` segment
pub fn parse_for_read(description: &str) -> Vec<Segment> {
    if !MARKER.is_match(description) {
        let text = description.trim();
        if text.is_empty() {
            return Vec::new();
        }
        return vec![Segment::new(NATIVE_SEGMENT, text)];
    }
    parse(description)
}

pub fn serialize(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str("[@");
        out.push_str(&segment.name);
        out.push_str(":]\n");
        out.push_str(&segment.content);
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// Reject names that would not parse back as their own marker
///
/// A name must contain a non-blank character and no `]`. `Native` is
/// reserved for unmarked text.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(']') || name == NATIVE_SEGMENT {
        return Err(MetadataError::InvalidSegmentName(name.to_string()));
    }
    Ok(())
}

/// Set the content of segment `name`, appending it if new
pub fn upsert(description: Option<&str>, name: &str, content: &str) -> Result<String> {
    validate_name(name)?;
    let mut segments = description.map(parse).unwrap_or_default();
    let content = content.trim();

    match segments.iter_mut().find(|segment| segment.name == name) {
        Some(existing) => existing.content = content.to_string(),
        None => segments.push(Segment::new(name, content)),
    }

    Ok(serialize(&segments))
}

/// How a description is turned into prompt text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Segment names to include; empty or `All` selects everything
    pub requested: Vec<String>,
    /// Show only the base name instead of the full path
    pub hide_file_path: bool,
    /// Emit only the tag and path lines
    pub tag_only: bool,
}

impl RenderOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn presets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requested: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn hide_file_path(mut self, hide: bool) -> Self {
        self.hide_file_path = hide;
        self
    }

    pub fn tag_only(mut self, tag_only: bool) -> Self {
        self.tag_only = tag_only;
        self
    }

    fn selects_all(&self) -> bool {
        self.requested.is_empty() || self.requested.iter().any(|name| name.eq_ignore_ascii_case("all"))
    }

    fn selects(&self, segment_name: &str) -> bool {
        self.selects_all()
            || self.requested.iter().any(|requested| {
                requested
                    .trim_start_matches('@')
                    .to_lowercase()
                    == segment_name.to_lowercase()
            })
    }
}

fn location_line(path: &Path, hide_file_path: bool) -> String {
    if hide_file_path {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        format!("[文件名: {}]", name)
    } else {
        format!("[文件路径: {}]", path.display())
    }
}

/// Render a description for prompt injection
///
/// Returns `None` when there is nothing to show: no description or no
/// selected segment, or no tags in tag-only mode.
pub fn render(
    path: &Path,
    description: Option<&str>,
    tags: Option<&str>,
    options: &RenderOptions,
) -> Option<String> {
    let location = location_line(path, options.hide_file_path);
    let tags = tags.map(str::trim);

    if options.tag_only {
        let tags = tags?;
        if tags.is_empty() {
            return Some(location);
        }
        return Some(format!("Tag: {}\n{}", tags, location));
    }

    let blocks: Vec<String> = parse_for_read(description?)
        .into_iter()
        .filter(|segment| options.selects(&segment.name))
        .map(|segment| format!("[{}]\n{}", segment.name, segment.content))
        .collect();

    if blocks.is_empty() {
        return None;
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out.push_str(&location);
    if let Some(tags) = tags.filter(|tags| !tags.is_empty()) {
        out.push_str("\nTag: ");
        out.push_str(tags);
    }
    Some(out)
}
