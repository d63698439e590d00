//! JPEG comment codec with EXIF fallback
//!
//! Marker-level walk of a JPEG stream up to the first `SOS`. Everything from
//! `SOS` onward (entropy-coded data, restart markers, `EOI`) is opaque and
//! copied through verbatim on rewrite.
//!
//! The description lives in a single `COM` marker. EXIF `ImageDescription`
//! (IFD0 tag `0x010E`) is consulted on read only.

use std::ops::Range;
use tracing::debug;

use crate::error::{MetadataError, Result};

pub const MARKER_SOI: u8 = 0xD8;
pub const MARKER_EOI: u8 = 0xD9;
pub const MARKER_SOS: u8 = 0xDA;
pub const MARKER_COM: u8 = 0xFE;
pub const MARKER_APP1: u8 = 0xE1;
const MARKER_TEM: u8 = 0x01;

const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";
const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
const TYPE_ASCII: u16 = 2;

/// Largest value the 16-bit segment length field can carry
const MAX_SEGMENT_LENGTH: usize = 0xFFFF;

/// One marker segment, as byte ranges over the original buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSegment {
    pub marker: u8,
    /// Fill bytes, marker, length field and payload
    pub raw: Range<usize>,
    pub payload: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegLayout {
    pub segments: Vec<MarkerSegment>,
    /// Start of the opaque remainder (normally the `SOS` marker)
    pub tail: usize,
}

fn is_standalone(marker: u8) -> bool {
    matches!(marker, MARKER_SOI | MARKER_TEM | 0xD0..=0xD7)
}

/// Walk marker segments until `SOS`, `EOI` or the first unparseable byte
///
/// # Errors
///
/// Returns `MalformedFormat` if the stream does not start with `SOI`.
pub fn parse_segments(data: &[u8]) -> Result<JpegLayout> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != MARKER_SOI {
        return Err(MetadataError::malformed("JPEG", "missing SOI marker"));
    }

    let mut segments = vec![MarkerSegment {
        marker: MARKER_SOI,
        raw: 0..2,
        payload: 2..2,
    }];
    let mut pos = 2;

    let tail = loop {
        let start = pos;
        if pos >= data.len() || data[pos] != 0xFF {
            break start;
        }
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            break start;
        }

        let marker = data[pos + 1];
        if marker == MARKER_SOS || marker == MARKER_EOI {
            break start;
        }

        if is_standalone(marker) {
            segments.push(MarkerSegment {
                marker,
                raw: start..pos + 2,
                payload: pos + 2..pos + 2,
            });
            pos += 2;
            continue;
        }

        if pos + 4 > data.len() {
            break start;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 2 + length;
        if length < 2 || end > data.len() {
            debug!(offset = pos, marker, length, "JPEG segment overruns buffer, stopping walk");
            break start;
        }

        segments.push(MarkerSegment {
            marker,
            raw: start..end,
            payload: pos + 4..end,
        });
        pos = end;
    };

    Ok(JpegLayout { segments, tail })
}

/// Where a JPEG description was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegDescription {
    Comment(String),
    Exif(String),
}

impl JpegDescription {
    pub fn text(&self) -> &str {
        match self {
            JpegDescription::Comment(text) | JpegDescription::Exif(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            JpegDescription::Comment(text) | JpegDescription::Exif(text) => text,
        }
    }
}

/// Read the description from the first `COM`, else from EXIF IFD0
pub fn read_description(data: &[u8]) -> Result<Option<JpegDescription>> {
    let layout = parse_segments(data)?;

    let comment = layout
        .segments
        .iter()
        .find(|segment| segment.marker == MARKER_COM)
        .map(|segment| String::from_utf8_lossy(&data[segment.payload.clone()]).trim().to_string())
        .filter(|text| !text.is_empty());

    if let Some(text) = comment {
        return Ok(Some(JpegDescription::Comment(text)));
    }

    let exif = layout
        .segments
        .iter()
        .filter(|segment| segment.marker == MARKER_APP1)
        .map(|segment| &data[segment.payload.clone()])
        .find(|payload| payload.starts_with(EXIF_HEADER))
        .and_then(|payload| read_exif_description(&payload[EXIF_HEADER.len()..]));

    Ok(exif.map(JpegDescription::Exif))
}

#[derive(Debug, Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// Extract IFD0 `ImageDescription` from a TIFF structure
///
/// Any structural problem yields `None`.
pub fn read_exif_description(tiff: &[u8]) -> Option<String> {
    let order = match tiff.get(0..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };

    if order.u16(tiff, 2)? != 42 {
        return None;
    }

    let ifd = order.u32(tiff, 4)? as usize;
    let entries = order.u16(tiff, ifd)? as usize;

    for index in 0..entries {
        let entry = ifd + 2 + index * 12;
        let tag = order.u16(tiff, entry)?;
        if tag != TAG_IMAGE_DESCRIPTION {
            continue;
        }
        if order.u16(tiff, entry + 2)? != TYPE_ASCII {
            continue;
        }

        let count = order.u32(tiff, entry + 4)? as usize;
        let value_start = if count <= 4 {
            entry + 8
        } else {
            order.u32(tiff, entry + 8)? as usize
        };
        let raw = tiff.get(value_start..value_start.checked_add(count)?)?;

        let text = String::from_utf8_lossy(raw)
            .trim_end_matches('\0')
            .trim()
            .to_string();
        return (!text.is_empty()).then_some(text);
    }

    None
}

/// Serialize a `COM` marker segment
pub fn build_comment_segment(text: &str) -> Result<Vec<u8>> {
    let length = text.len() + 2;
    if length > MAX_SEGMENT_LENGTH {
        return Err(MetadataError::TextTooLong {
            format: "JPEG",
            length: text.len(),
            max: MAX_SEGMENT_LENGTH - 2,
        });
    }

    let mut segment = Vec::with_capacity(length + 2);
    segment.push(0xFF);
    segment.push(MARKER_COM);
    segment.extend_from_slice(&(length as u16).to_be_bytes());
    segment.extend_from_slice(text.as_bytes());
    Ok(segment)
}

/// Rebuild a JPEG stream carrying exactly one `COM` with `text`
///
/// Returns `Ok(None)` when `text` is blank. Existing comments are dropped;
/// the new one takes the place of the first of them, or sits right before
/// the scan data if there were none.
pub fn write_description(data: &[u8], text: &str) -> Result<Option<Vec<u8>>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let layout = parse_segments(data)?;
    let comment = build_comment_segment(text)?;

    let mut out = Vec::with_capacity(data.len() + comment.len());
    let mut inserted = false;
    let mut dropped = 0usize;

    for segment in &layout.segments {
        if segment.marker == MARKER_COM {
            dropped += 1;
            if !inserted {
                out.extend_from_slice(&comment);
                inserted = true;
            }
            continue;
        }
        out.extend_from_slice(&data[segment.raw.clone()]);
    }

    if !inserted {
        out.extend_from_slice(&comment);
    }
    out.extend_from_slice(&data[layout.tail..]);

    debug!(segments = layout.segments.len(), dropped, "Rebuilt JPEG with comment marker");
    Ok(Some(out))
}
