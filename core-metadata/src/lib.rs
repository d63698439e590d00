//! # Media Description Module
//!
//! Stores free-text descriptions and tags for media files and keeps them
//! attached to the right file.
//!
//! ## Overview
//!
//! This module handles:
//! - Sidecar records (`<file>.desc.json`), the authoritative store
//! - Segmented description text, one named block per recognition preset
//! - PNG `iTXt` and JPEG `COM` mirrors written straight into the media bytes
//! - EXIF `ImageDescription` as a read-only fallback
//! - Content-hash reconciliation of sidecars after external renames
//! - Directory classification into text and multimedia files

pub mod classifier;
pub mod embedded;
pub mod error;
pub mod hashing;
pub mod jpeg;
pub mod media;
pub mod png;
pub mod reconcile;
pub mod record;
pub mod segments;
pub mod service;
pub mod sidecar;

pub use classifier::{scan_directory, DirectoryListing};
pub use embedded::EmbeddedMirror;
pub use error::{MetadataError, Result};
pub use media::{EmbeddedFormat, MediaCategory, MultimediaFile};
pub use reconcile::{ReconciliationReport, Reconciler};
pub use record::{DescriptionRecord, DescriptionSource, EmbeddedMetadata, StoredDescription};
pub use segments::{RenderOptions, Segment};
pub use service::DescriptionService;
pub use sidecar::SidecarStore;
