//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`
//!
//! Recognition backends are host-specific and are not shipped here.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use std::sync::Arc;
//!
//! let fs = Arc::new(TokioFileSystem::new());
//! let config = CoreConfig::builder().file_system(fs).build()?;
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
