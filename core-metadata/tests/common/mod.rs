//! Shared fixtures for core-metadata integration tests
//!
//! PNG and JPEG files are synthesized byte by byte so every test knows the
//! exact layout it starts from.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{DescriptionRecognizer, FixedClock, Recognition, RecognitionRequest};
use chrono::{TimeZone, Utc};
use core_metadata::png::{crc32, PNG_SIGNATURE};
use core_metadata::DescriptionService;
use core_runtime::config::CoreConfig;
use mockall::mock;
use std::path::Path;
use std::sync::Arc;

mock! {
    pub Recognizer {}

    #[async_trait]
    impl DescriptionRecognizer for Recognizer {
        async fn recognize(&self, request: RecognitionRequest) -> BridgeResult<Recognition>;
        fn model_name(&self) -> String;
    }
}

pub fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(&[kind, data]).to_be_bytes());
    out
}

pub fn png_from_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// 1x1 RGBA PNG with two ancillary chunks besides the text chunk
pub fn sample_png_chunks() -> Vec<Vec<u8>> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

    let mut phys = Vec::new();
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.push(1);

    vec![
        png_chunk(b"IHDR", &ihdr),
        png_chunk(b"gAMA", &45455u32.to_be_bytes()),
        png_chunk(b"pHYs", &phys),
        png_chunk(b"tEXt", b"Software\0fixture-builder"),
        png_chunk(b"IDAT", &[0x78, 0x9C, 0x63, 0xF8, 0x0F, 0x00, 0x01, 0x01, 0x01, 0x00]),
        png_chunk(b"IEND", &[]),
    ]
}

pub fn sample_png() -> Vec<u8> {
    png_from_chunks(&sample_png_chunks())
}

pub fn jpeg_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, marker];
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn jpeg_scan() -> Vec<u8> {
    let mut out = jpeg_segment(0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out.extend_from_slice(&[0xAB, 0xFF, 0x00, 0xCD, 0xFF, 0xD3, 0xEF]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

pub fn jpeg_from_segments(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&jpeg_scan());
    out
}

pub fn sample_jpeg() -> Vec<u8> {
    jpeg_from_segments(&[
        jpeg_segment(0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"),
        jpeg_segment(0xDB, &[0u8; 65]),
    ])
}

/// Big-endian EXIF APP1 with IFD0 ImageDescription stored out of line
pub fn exif_segment(description: &str) -> Vec<u8> {
    let mut value = description.as_bytes().to_vec();
    value.push(0);

    let mut tiff = b"MM\0*".to_vec();
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x010Eu16.to_be_bytes());
    tiff.extend_from_slice(&2u16.to_be_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_be_bytes());
    tiff.extend_from_slice(&26u32.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&value);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    jpeg_segment(0xE1, &payload)
}

pub fn fixed_clock(hour: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()))
}

pub fn config_builder(hour: u32) -> core_runtime::config::CoreConfigBuilder {
    CoreConfig::builder()
        .file_system(Arc::new(TokioFileSystem::new()))
        .clock(fixed_clock(hour))
}

pub fn service() -> DescriptionService {
    DescriptionService::new(&config_builder(9).build().unwrap())
}

pub fn write(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap();
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
