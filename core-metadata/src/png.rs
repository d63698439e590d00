//! PNG text-chunk codec
//!
//! Reads and writes the description mirror of a PNG file at chunk level,
//! without decoding any image data.
//!
//! ## Layout
//!
//! A PNG stream is the 8-byte signature followed by chunks of
//! `length:u32be | type:[u8;4] | data | crc:u32be`. Parsing records each
//! chunk as byte ranges over the original buffer; rebuilding copies those
//! ranges in order and substitutes (or inserts) exactly one `iTXt` chunk.
//!
//! Truncated input is tolerated: the walk stops at the first chunk that would
//! overrun the buffer and the unparsed tail is carried through verbatim on
//! rewrite.

use flate2::read::ZlibDecoder;
use std::io::Read;
use std::ops::Range;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// The fixed 8-byte PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Keyword written by this codec and replaced on rewrite
pub const DESCRIPTION_KEYWORD: &str = "Description";

/// Additional keyword accepted on read
pub const COMMENT_KEYWORD: &str = "Comment";

const CHUNK_TEXT: [u8; 4] = *b"tEXt";
const CHUNK_ITXT: [u8; 4] = *b"iTXt";
const CHUNK_IHDR: [u8; 4] = *b"IHDR";

/// Largest chunk data length allowed by the PNG format
const MAX_CHUNK_LENGTH: usize = 0x7FFF_FFFF;

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            if c & 1 != 0 {
                c = 0xEDB8_8320 ^ (c >> 1);
            } else {
                c >>= 1;
            }
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 (IEEE 802.3, reflected) over the concatenation of `parts`
pub fn crc32(parts: &[&[u8]]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for part in parts {
        for &byte in part.iter() {
            crc = CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }
    }
    !crc
}

/// Position of one chunk inside the original buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub kind: [u8; 4],
    /// Whole chunk: length field through CRC
    pub raw: Range<usize>,
    /// Chunk data only
    pub data: Range<usize>,
}

impl ChunkSpan {
    pub fn kind_str(&self) -> &str {
        std::str::from_utf8(&self.kind).unwrap_or("????")
    }

    fn is_text(&self) -> bool {
        self.kind == CHUNK_TEXT || self.kind == CHUNK_ITXT
    }
}

/// Parsed chunk boundaries of a PNG buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngLayout {
    pub chunks: Vec<ChunkSpan>,
    /// Offset where structured parsing stopped; bytes from here are opaque
    pub tail: usize,
}

/// Walk the chunk list of a PNG buffer
///
/// # Errors
///
/// Returns `MalformedFormat` if the signature is missing.
pub fn parse_chunks(data: &[u8]) -> Result<PngLayout> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(MetadataError::malformed("PNG", "missing PNG signature"));
    }

    let mut chunks = Vec::new();
    let mut pos = PNG_SIGNATURE.len();

    while pos + 8 <= data.len() {
        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        let kind = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        let data_start = pos + 8;

        let Some(end) = data_start
            .checked_add(length)
            .and_then(|n| n.checked_add(4))
            .filter(|&end| end <= data.len())
        else {
            debug!(offset = pos, length, "PNG chunk overruns buffer, stopping walk");
            break;
        };

        chunks.push(ChunkSpan {
            kind,
            raw: pos..end,
            data: data_start..data_start + length,
        });
        pos = end;
    }

    Ok(PngLayout { chunks, tail: pos })
}

/// A decoded `tEXt` or `iTXt` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn split_nul(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = bytes.iter().position(|&b| b == 0)?;
    Some((&bytes[..nul], &bytes[nul + 1..]))
}

/// Decode the data of a `tEXt` / `iTXt` chunk
///
/// Returns `None` for other chunk types or structurally broken text chunks.
pub fn decode_text_chunk(kind: [u8; 4], data: &[u8]) -> Option<TextChunk> {
    match kind {
        CHUNK_TEXT => {
            let (keyword, text) = split_nul(data)?;
            Some(TextChunk {
                keyword: latin1(keyword),
                text: latin1(text),
            })
        }
        CHUNK_ITXT => {
            let (keyword, rest) = split_nul(data)?;
            if rest.len() < 2 {
                return None;
            }
            let (compression_flag, compression_method) = (rest[0], rest[1]);
            let (_language, rest) = split_nul(&rest[2..])?;
            let (_translated, payload) = split_nul(rest)?;

            let text = if compression_flag == 1 && compression_method == 0 {
                let mut inflated = Vec::new();
                match ZlibDecoder::new(payload).read_to_end(&mut inflated) {
                    Ok(_) => String::from_utf8_lossy(&inflated).into_owned(),
                    Err(e) => {
                        debug!(error = %e, "iTXt inflate failed, using raw payload");
                        String::from_utf8_lossy(payload).into_owned()
                    }
                }
            } else {
                String::from_utf8_lossy(payload).into_owned()
            };

            Some(TextChunk {
                keyword: String::from_utf8_lossy(keyword).into_owned(),
                text,
            })
        }
        _ => None,
    }
}

/// Read the embedded description of a PNG buffer
///
/// The first `tEXt`/`iTXt` chunk keyed `Description` or `Comment` wins and
/// its text is returned untouched.
pub fn read_description(data: &[u8]) -> Result<Option<String>> {
    let layout = parse_chunks(data)?;

    let text = layout
        .chunks
        .iter()
        .filter(|chunk| chunk.is_text())
        .filter_map(|chunk| decode_text_chunk(chunk.kind, &data[chunk.data.clone()]))
        .find(|text| text.keyword == DESCRIPTION_KEYWORD || text.keyword == COMMENT_KEYWORD)
        .map(|text| text.text);

    Ok(text)
}

/// Serialize a complete uncompressed `iTXt` chunk carrying `text`
pub fn build_description_chunk(text: &str) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(DESCRIPTION_KEYWORD.len() + 5 + text.len());
    body.extend_from_slice(DESCRIPTION_KEYWORD.as_bytes());
    body.push(0); // keyword terminator
    body.push(0); // compression flag
    body.push(0); // compression method
    body.push(0); // empty language tag
    body.push(0); // empty translated keyword
    body.extend_from_slice(text.as_bytes());

    if body.len() > MAX_CHUNK_LENGTH {
        return Err(MetadataError::TextTooLong {
            format: "PNG",
            length: text.len(),
            max: MAX_CHUNK_LENGTH - (body.len() - text.len()),
        });
    }

    let crc = crc32(&[&CHUNK_ITXT, &body]);

    let mut chunk = Vec::with_capacity(body.len() + 12);
    chunk.extend_from_slice(&(body.len() as u32).to_be_bytes());
    chunk.extend_from_slice(&CHUNK_ITXT);
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&crc.to_be_bytes());
    Ok(chunk)
}

fn is_description_chunk(data: &[u8], chunk: &ChunkSpan) -> bool {
    chunk.is_text()
        && decode_text_chunk(chunk.kind, &data[chunk.data.clone()])
            .is_some_and(|text| text.keyword == DESCRIPTION_KEYWORD)
}

/// Rebuild a PNG buffer with `text` as its description
///
/// Returns `Ok(None)` when `text` is blank (nothing to write). The first
/// existing `Description` text chunk is replaced in place; otherwise the new
/// chunk is inserted right after `IHDR`. Every other chunk is copied
/// byte-for-byte in original order.
pub fn write_description(data: &[u8], text: &str) -> Result<Option<Vec<u8>>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let layout = parse_chunks(data)?;
    let new_chunk = build_description_chunk(text)?;

    let replace_at = layout
        .chunks
        .iter()
        .position(|chunk| is_description_chunk(data, chunk));

    let insert_after = match replace_at {
        Some(_) => None,
        None => Some(
            layout
                .chunks
                .iter()
                .position(|chunk| chunk.kind == CHUNK_IHDR)
                .ok_or_else(|| MetadataError::malformed("PNG", "missing IHDR chunk"))?,
        ),
    };

    let mut out = Vec::with_capacity(data.len() + new_chunk.len());
    out.extend_from_slice(&PNG_SIGNATURE);

    for (index, chunk) in layout.chunks.iter().enumerate() {
        if Some(index) == replace_at {
            out.extend_from_slice(&new_chunk);
        } else {
            out.extend_from_slice(&data[chunk.raw.clone()]);
        }

        if Some(index) == insert_after {
            out.extend_from_slice(&new_chunk);
        }
    }

    out.extend_from_slice(&data[layout.tail..]);

    debug!(
        chunks = layout.chunks.len(),
        replaced = replace_at.is_some(),
        "Rebuilt PNG with description chunk"
    );
    Ok(Some(out))
}
