//! # Host Bridge Traits
//!
//! Capability traits that a host must provide to the description engine.
//!
//! ## Overview
//!
//! The engine itself only manipulates bytes and JSON. Everything that touches
//! the outside world is expressed as a trait here so that desktop, server and
//! test hosts can each inject their own implementation.
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O, listing and renames
//! - [`DescriptionRecognizer`](recognition::DescriptionRecognizer) - Produces description text and tags for a file
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core should fail fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! let file_system = config.file_system
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "FileSystemAccess".to_string(),
//!         message: "No file system implementation provided. \
//!                  Desktop: enable the 'desktop-shims' feature.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! must map a missing path to `BridgeError::NotFound` (or an `Io` error of kind
//! `NotFound`) so the engine can degrade to "no description" instead of failing.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod recognition;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use recognition::{DescriptionRecognizer, Recognition, RecognitionRequest};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
